//! Qualitative colour palettes

/// Nine-colour qualitative palette used for year overlays
pub const SET1: [&str; 9] = [
    "rgb(228,26,28)",
    "rgb(55,126,184)",
    "rgb(77,175,74)",
    "rgb(152,78,163)",
    "rgb(255,127,0)",
    "rgb(255,255,51)",
    "rgb(166,86,40)",
    "rgb(247,129,191)",
    "rgb(153,153,153)",
];

/// Twelve-colour qualitative palette used for day overlays
pub const SET3: [&str; 12] = [
    "rgb(141,211,199)",
    "rgb(255,255,179)",
    "rgb(190,186,218)",
    "rgb(251,128,114)",
    "rgb(128,177,211)",
    "rgb(253,180,98)",
    "rgb(179,222,105)",
    "rgb(252,205,229)",
    "rgb(217,217,217)",
    "rgb(188,128,189)",
    "rgb(204,235,197)",
    "rgb(255,237,111)",
];

/// Palette entry for `index`, wrapping around
pub fn cycle(palette: &[&'static str], index: usize) -> &'static str {
    palette[index % palette.len()]
}
