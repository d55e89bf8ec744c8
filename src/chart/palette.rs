use plotters::style::RGBColor;

pub const DEFAULT_COLOR: &str = "#8884d8";

const BLOCKCHAIN_COLORS: &[(&str, &str)] = &[
    ("ethereum", "#716b94"),
    ("solana", "#14F195"),
    ("bitcoin", "#F7931A"),
    ("bnb", "#F3BA2F"),
    ("arbitrum", "#28A0F0"),
    ("base", "#0052FF"),
    ("optimism", "#FF0420"),
    ("polygon", "#8247E5"),
    ("avalanche_c", "#E84142"),
    ("tron", "#FF0013"),
    ("zksync", "#4E529A"),
    ("fantom", "#1969FF"),
    ("mantle", "#0000FF"),
    ("linea", "#23A7F2"),
    ("scroll", "#FDB82B"),
    ("blast", "#000000"),
    ("ronin", "#D6F5D6"),
    ("celo", "#35D07F"),
    ("zkevm", "#8C8C8C"),
    ("gnosis", "#03fc1c"),
    ("zora", "#909090"),
    ("sei", "#FF00FF"),
];

/// Hex color for a blockchain identifier, [`DEFAULT_COLOR`] when unknown.
pub fn color_hex(blockchain: &str) -> &'static str {
    BLOCKCHAIN_COLORS
        .iter()
        .find(|(name, _)| *name == blockchain)
        .map(|(_, hex)| *hex)
        .unwrap_or(DEFAULT_COLOR)
}

pub fn color_for(blockchain: &str) -> RGBColor {
    parse_hex(color_hex(blockchain)).unwrap_or(RGBColor(0x88, 0x84, 0xd8))
}

/// Display name used in the legend and tooltips: the first `_` becomes a space.
pub fn legend_name(blockchain: &str) -> String {
    blockchain.replacen('_', " ", 1)
}

pub fn parse_hex(hex: &str) -> Option<RGBColor> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}
