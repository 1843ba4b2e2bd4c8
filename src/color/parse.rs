use std::sync::LazyLock;

use regex::Regex;

use super::Rgb;

static FUNCTIONAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(rgba?|hsla?)\(\s*([^)]*?)\s*\)$").expect("functional color pattern is valid")
});

static ARGUMENT_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[,/]\s*|\s+").expect("argument separator is valid"));

/// Parse a CSS color. Returns `None` for anything outside the supported syntax.
pub fn parse_color(input: &str) -> Option<Rgb> {
    let value = input.trim().to_ascii_lowercase();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(captures) = FUNCTIONAL_PATTERN.captures(&value) {
        let args: Vec<&str> = ARGUMENT_SEPARATOR
            .split(&captures[2])
            .filter(|arg| !arg.is_empty())
            .collect();
        return if captures[1].starts_with("rgb") {
            parse_rgb_args(&args)
        } else {
            parse_hsl_args(&args)
        };
    }
    named_color(&value)
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let digits: Vec<u8> = match hex.len() {
        3 | 4 => hex
            .chars()
            .map(|c| u8::from_str_radix(&format!("{c}{c}"), 16).ok())
            .collect::<Option<_>>()?,
        6 | 8 => (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
            .collect::<Option<_>>()?,
        _ => return None,
    };
    let alpha = digits.get(3).copied().unwrap_or(u8::MAX);
    Some(Rgb::with_alpha(digits[0], digits[1], digits[2], alpha))
}

fn parse_rgb_args(args: &[&str]) -> Option<Rgb> {
    if !(3..=4).contains(&args.len()) {
        return None;
    }
    let channel = |arg: &str| -> Option<u8> {
        let value = match arg.strip_suffix('%') {
            Some(percent) => percent.parse::<f64>().ok()? * 2.55,
            None => arg.parse::<f64>().ok()?,
        };
        value.is_finite().then(|| value.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = match args.get(3) {
        Some(arg) => parse_alpha(arg)?,
        None => u8::MAX,
    };
    Some(Rgb::with_alpha(
        channel(args[0])?,
        channel(args[1])?,
        channel(args[2])?,
        alpha,
    ))
}

fn parse_hsl_args(args: &[&str]) -> Option<Rgb> {
    if !(3..=4).contains(&args.len()) {
        return None;
    }
    let hue: f64 = args[0].trim_end_matches("deg").parse().ok()?;
    let saturation = parse_percent(args[1])?;
    let lightness = parse_percent(args[2])?;
    let alpha = match args.get(3) {
        Some(arg) => parse_alpha(arg)?,
        None => u8::MAX,
    };
    if !hue.is_finite() {
        return None;
    }

    let hue = hue.rem_euclid(360.0) / 360.0;
    let (r, g, b) = hsl_to_rgb(hue, saturation, lightness);
    Some(Rgb::with_alpha(r, g, b, alpha))
}

fn parse_percent(arg: &str) -> Option<f64> {
    let value: f64 = arg.strip_suffix('%')?.parse().ok()?;
    value.is_finite().then(|| (value / 100.0).clamp(0.0, 1.0))
}

fn parse_alpha(arg: &str) -> Option<u8> {
    let value = match arg.strip_suffix('%') {
        Some(percent) => percent.parse::<f64>().ok()? / 100.0,
        None => arg.parse::<f64>().ok()?,
    };
    value
        .is_finite()
        .then(|| (value.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    if s == 0.0 {
        let gray = to_byte(l);
        return (gray, gray, gray);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    (
        to_byte(hue_to_channel(p, q, h + 1.0 / 3.0)),
        to_byte(hue_to_channel(p, q, h)),
        to_byte(hue_to_channel(p, q, h - 1.0 / 3.0)),
    )
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn to_byte(channel: f64) -> u8 {
    (channel * 255.0).round().clamp(0.0, 255.0) as u8
}

fn named_color(name: &str) -> Option<Rgb> {
    let rgb = match name {
        "black" => Rgb::new(0, 0, 0),
        "white" => Rgb::new(255, 255, 255),
        "red" => Rgb::new(255, 0, 0),
        "green" => Rgb::new(0, 128, 0),
        "lime" => Rgb::new(0, 255, 0),
        "blue" => Rgb::new(0, 0, 255),
        "yellow" => Rgb::new(255, 255, 0),
        "orange" => Rgb::new(255, 165, 0),
        "purple" => Rgb::new(128, 0, 128),
        "gray" | "grey" => Rgb::new(128, 128, 128),
        "silver" => Rgb::new(192, 192, 192),
        "navy" => Rgb::new(0, 0, 128),
        "teal" => Rgb::new(0, 128, 128),
        "transparent" => Rgb::with_alpha(0, 0, 0, 0),
        _ => return None,
    };
    Some(rgb)
}
