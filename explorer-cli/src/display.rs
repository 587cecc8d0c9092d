//! Terminal rendering of observations, records and analysis.

use explorer_core::{
    Observation, Stats, Video, WeatherRecord,
    analysis::AnalysisReport,
    model::DATE_FORMAT,
};

const BAR_WIDTH: usize = 30;

/// Pick an icon by keyword; the first match wins.
pub fn condition_icon(description: &str) -> &'static str {
    let desc = description.to_lowercase();
    const ICONS: [(&[&str], &str); 7] = [
        (&["clear"], "☀️"),
        (&["sun"], "🌞"),
        (&["cloud"], "☁️"),
        (&["rain"], "🌧️"),
        (&["thunder"], "⛈️"),
        (&["snow"], "❄️"),
        (&["mist", "fog"], "🌫️"),
    ];

    ICONS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| desc.contains(k)))
        .map(|(_, icon)| *icon)
        .unwrap_or("🌦️")
}

/// Capitalize the first letter of each word.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_temperature(celsius: f64) -> String {
    format!("{celsius:.1}°C")
}

/// Horizontal bar scaled so that `max` fills the full width.
pub fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || !value.is_finite() || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(len.clamp(1, BAR_WIDTH))
}

pub fn print_observation(obs: &Observation) {
    let icon = condition_icon(&obs.conditions.description);

    println!("{icon}  {}", obs.location);
    println!("   Temperature: {}", format_temperature(obs.conditions.temperature_c));
    println!("   Conditions:  {}", title_case(&obs.conditions.description));
    println!(
        "   Coordinates: {:.4}, {:.4}",
        obs.coordinates.latitude, obs.coordinates.longitude
    );
}

pub fn print_records(records: &[WeatherRecord]) {
    if records.is_empty() {
        println!("No weather records found.");
        return;
    }

    println!(
        "{:>5}  {:<24} {:<10}  {:<10}  {:>8}  {}",
        "ID", "Location", "Start", "End", "Temp", "Conditions"
    );
    for r in records {
        println!(
            "{:>5}  {:<24} {:<10}  {:<10}  {:>8}  {} {}",
            r.id,
            truncate(&r.location, 24),
            r.start_date.format(DATE_FORMAT),
            r.end_date.format(DATE_FORMAT),
            format_temperature(r.temperature),
            condition_icon(&r.weather_desc),
            r.weather_desc,
        );
    }
}

pub fn print_record(r: &WeatherRecord) {
    println!("Record #{}", r.id);
    println!("  Location:    {}", r.location);
    match (r.latitude, r.longitude) {
        (Some(lat), Some(lng)) => println!("  Coordinates: {lat:.4}, {lng:.4}"),
        _ => println!("  Coordinates: unknown"),
    }
    println!(
        "  Date range:  {} to {}",
        r.start_date.format(DATE_FORMAT),
        r.end_date.format(DATE_FORMAT)
    );
    println!("  Temperature: {}", format_temperature(r.temperature));
    println!("  Conditions:  {} {}", condition_icon(&r.weather_desc), title_case(&r.weather_desc));
    println!("  Requested:   {}", r.request_time.format("%Y-%m-%d %H:%M:%S UTC"));
}

pub fn print_dashboard(stats: &Stats, recent: &[WeatherRecord]) {
    println!("Total records:          {}", stats.count);
    println!(
        "Most searched location: {}",
        stats.most_frequent_location.as_deref().unwrap_or("none")
    );
    println!(
        "Average temperature:    {}",
        stats.average_temperature.map(format_temperature).unwrap_or_else(|| "none".to_string())
    );

    if recent.is_empty() {
        return;
    }

    println!();
    println!("Recent searches:");
    for r in recent {
        println!(
            "  {} {} ({})",
            condition_icon(&r.weather_desc),
            r.location,
            format_temperature(r.temperature)
        );
    }
}

pub fn print_analysis(report: Option<&AnalysisReport>) {
    let Some(report) = report else {
        println!("No data available for analysis.");
        return;
    };

    let summary = &report.summary;
    println!("Temperature distribution ({} records)", report.record_count);
    println!(
        "  min {}  max {}  mean {}  median {}",
        format_temperature(summary.min),
        format_temperature(summary.max),
        format_temperature(summary.mean),
        format_temperature(summary.median)
    );
    let peak = report.distribution.iter().map(|(_, n)| *n).max().unwrap_or(0) as f64;
    for (temp, n) in &report.distribution {
        println!("  {:>8} {:>4} {}", format_temperature(*temp), n, bar(*n as f64, peak));
    }

    println!();
    println!("Top locations");
    let peak = report.top_locations.first().map(|(_, n)| *n).unwrap_or(0) as f64;
    for (location, n) in &report.top_locations {
        println!("  {:<24} {:>4} {}", truncate(location, 24), n, bar(*n as f64, peak));
    }

    println!();
    println!("Average temperature by location");
    for (location, avg) in &report.by_location {
        println!("  {:<24} {:>8}", truncate(location, 24), format_temperature(*avg));
    }

    println!();
    println!("Monthly average temperature");
    for (month, avg) in report.monthly {
        println!("  {month:<3} {:>8}", format_temperature(avg));
    }
}

pub fn print_videos(location: &str, videos: &[Video]) {
    if videos.is_empty() {
        println!("No videos found for {location}.");
        return;
    }

    println!("Weather videos for {location}:");
    for v in videos {
        println!("  {}", v.title);
        println!("    {}", v.url);
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icons_follow_keywords() {
        assert_eq!(condition_icon("clear sky"), "☀️");
        assert_eq!(condition_icon("Sunny"), "🌞");
        assert_eq!(condition_icon("broken clouds"), "☁️");
        assert_eq!(condition_icon("light rain"), "🌧️");
        assert_eq!(condition_icon("thunderstorm"), "⛈️");
        assert_eq!(condition_icon("light snow"), "❄️");
        assert_eq!(condition_icon("fog"), "🌫️");
    }

    #[test]
    fn earlier_keywords_take_precedence() {
        assert_eq!(condition_icon("thunderstorm with light rain"), "🌧️");
        assert_eq!(condition_icon("rain and snow"), "🌧️");
        assert_eq!(condition_icon("clouds with sun"), "🌞");
        assert_eq!(condition_icon("haze"), "🌦️");
        assert_eq!(condition_icon("mist"), "🌫️");
        assert_eq!(condition_icon("tornado"), "🌦️");
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("broken clouds"), "Broken Clouds");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn temperature_has_one_decimal() {
        assert_eq!(format_temperature(18.0), "18.0°C");
        assert_eq!(format_temperature(-3.26), "-3.3°C");
    }

    #[test]
    fn bar_scales_to_width() {
        assert_eq!(bar(10.0, 10.0).chars().count(), BAR_WIDTH);
        assert_eq!(bar(0.1, 100.0).chars().count(), 1);
        assert!(bar(0.0, 10.0).is_empty());
        assert!(bar(5.0, 0.0).is_empty());
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("Paris", 24), "Paris");
        assert_eq!(truncate("Llanfairpwllgwyngyll", 10).chars().count(), 10);
    }
}
