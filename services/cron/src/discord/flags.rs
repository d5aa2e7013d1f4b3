/// (alpha-3, alpha-2, country name as Ergast spells it) for every country that
/// has hosted a championship round.
const COUNTRIES: &[(&str, &str, &str)] = &[
    ("ARE", "AE", "UAE"),
    ("ARG", "AR", "Argentina"),
    ("AUS", "AU", "Australia"),
    ("AUT", "AT", "Austria"),
    ("AZE", "AZ", "Azerbaijan"),
    ("BEL", "BE", "Belgium"),
    ("BHR", "BH", "Bahrain"),
    ("BRA", "BR", "Brazil"),
    ("CAN", "CA", "Canada"),
    ("CHE", "CH", "Switzerland"),
    ("CHN", "CN", "China"),
    ("DEU", "DE", "Germany"),
    ("ESP", "ES", "Spain"),
    ("FRA", "FR", "France"),
    ("GBR", "GB", "UK"),
    ("HUN", "HU", "Hungary"),
    ("IND", "IN", "India"),
    ("ITA", "IT", "Italy"),
    ("JPN", "JP", "Japan"),
    ("KOR", "KR", "Korea"),
    ("MAR", "MA", "Morocco"),
    ("MCO", "MC", "Monaco"),
    ("MEX", "MX", "Mexico"),
    ("MYS", "MY", "Malaysia"),
    ("NLD", "NL", "Netherlands"),
    ("PRT", "PT", "Portugal"),
    ("QAT", "QA", "Qatar"),
    ("RUS", "RU", "Russia"),
    ("SAU", "SA", "Saudi Arabia"),
    ("SGP", "SG", "Singapore"),
    ("SWE", "SE", "Sweden"),
    ("TUR", "TR", "Turkey"),
    ("USA", "US", "USA"),
    ("VNM", "VN", "Vietnam"),
    ("ZAF", "ZA", "South Africa"),
];

/// Regional-indicator flag for an alpha-3 country code.
pub fn flag_emoji(alpha3: &str) -> Option<String> {
    let (_, alpha2, _) = COUNTRIES
        .iter()
        .find(|(code, _, _)| code.eq_ignore_ascii_case(alpha3))?;
    alpha2
        .chars()
        .map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)))
        .collect()
}

/// Maps the country name used in Ergast circuit locations to alpha-3.
pub fn alpha3_for_country(name: &str) -> Option<&'static str> {
    let name = name.trim();
    let name = match name {
        "United States" | "United States of America" => "USA",
        "United Kingdom" | "Great Britain" => "UK",
        "United Arab Emirates" => "UAE",
        other => other,
    };
    COUNTRIES
        .iter()
        .find(|(_, _, country)| country.eq_ignore_ascii_case(name))
        .map(|(alpha3, _, _)| *alpha3)
}
