//! Rule-based player compatibility and court distance helpers.
//!
//! Factor weights: location 0.3, age 0.2/0.1, skill 0.3/0.2/0.1, playing style
//! 0.2/0.15. The total is capped at 1.0 and feeds the ranker as an additive bonus.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schedule::Compatibility;

/// Minimum score for an opponent to be recommended at all.
pub const RECOMMENDATION_THRESHOLD: f64 = 0.3;
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;

const EARTH_RADIUS_MILES: f64 = 3959.0;
const FEET_PER_MILE: f64 = 5280.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayingStyle {
    Aggressive,
    Defensive,
    AllCourt,
    ServeAndVolley,
    Counterpuncher,
}

impl PlayingStyle {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "aggressive" | "aggressive_baseliner" => Some(Self::Aggressive),
            "defensive" | "defensive_baseliner" => Some(Self::Defensive),
            "all_court" | "allcourt" => Some(Self::AllCourt),
            "serve_and_volley" => Some(Self::ServeAndVolley),
            "counterpuncher" | "counter_puncher" => Some(Self::Counterpuncher),
            _ => None,
        }
    }

    /// Different styles that still make for a good match
    fn complements(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Aggressive, Self::Defensive) | (Self::Defensive, Self::Aggressive)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    /// NTRP rating
    #[serde(default)]
    pub current_rating: Option<f64>,
    #[serde(default)]
    pub playing_style: Option<PlayingStyle>,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecommendation {
    pub recommended_player_id: String,
    pub recommendation_score: f64,
    pub reasoning: String,
    pub factors_matched: Vec<String>,
}

/// Compatibility of `other` as an opponent for `player`
pub fn compatibility_between(player: &PlayerProfile, other: &PlayerProfile) -> Compatibility {
    let mut score = 0.0;
    let mut factors = Vec::new();

    if let (Some(a), Some(b)) = (&player.location, &other.location) {
        let (a, b) = (a.trim().to_lowercase(), b.trim().to_lowercase());
        if !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a)) {
            score += 0.3;
            factors.push("location".to_string());
        }
    }

    if let (Some(a), Some(b)) = (player.age, other.age) {
        let bonus = match a.abs_diff(b) {
            0..=5 => 0.2,
            6..=10 => 0.1,
            _ => 0.0,
        };
        if bonus > 0.0 {
            score += bonus;
            factors.push("age".to_string());
        }
    }

    if let (Some(a), Some(b)) = (player.current_rating, other.current_rating) {
        let diff = (a - b).abs();
        let bonus = if diff <= 0.5 {
            0.3
        } else if diff <= 1.0 {
            0.2
        } else if diff <= 1.5 {
            0.1
        } else {
            0.0
        };
        if bonus > 0.0 {
            score += bonus;
            factors.push("skill_level".to_string());
        }
    }

    if let (Some(a), Some(b)) = (player.playing_style, other.playing_style) {
        if a == b {
            score += 0.2;
            factors.push("playing_style".to_string());
        } else if a.complements(b) {
            score += 0.15;
            factors.push("playing_style".to_string());
        }
    }

    Compatibility {
        score: f64::min(score, 1.0),
        factors,
    }
}

fn reasoning_for(name: &str, factors: &[String]) -> String {
    let reasons: Vec<&str> = factors
        .iter()
        .filter_map(|factor| match factor.as_str() {
            "location" => Some("you're in the same area"),
            "age" => Some("you're similar in age"),
            "skill_level" => Some("you have similar skill levels"),
            "playing_style" => Some("your playing styles complement each other"),
            _ => None,
        })
        .collect();
    format!("{name} is a great match because {}.", reasons.join(", "))
}

/// Best opponents for `player` among `others`, strongest first
pub fn recommend_players(
    player: &PlayerProfile,
    others: &[PlayerProfile],
    limit: usize,
) -> Vec<PlayerRecommendation> {
    let mut recommendations: Vec<PlayerRecommendation> = others
        .iter()
        .filter(|other| other.id != player.id)
        .filter_map(|other| {
            let compat = compatibility_between(player, other);
            (compat.score > RECOMMENDATION_THRESHOLD).then(|| PlayerRecommendation {
                recommended_player_id: other.id.clone(),
                recommendation_score: compat.score,
                reasoning: reasoning_for(&other.full_name, &compat.factors),
                factors_matched: compat.factors,
            })
        })
        .collect();

    recommendations.sort_by(|a, b| {
        b.recommendation_score
            .partial_cmp(&a.recommendation_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.recommended_player_id.cmp(&b.recommended_player_id))
    });
    recommendations.truncate(limit);

    debug!(
        player = %player.id,
        considered = others.len(),
        recommended = recommendations.len(),
        "computed player recommendations"
    );
    recommendations
}

/// Great-circle distance in miles
pub fn haversine_miles(from: GeoPoint, to: GeoPoint) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_MILES * c
}

/// "850 ft" under a mile, "3.2 mi" otherwise
pub fn format_distance(miles: f64) -> String {
    if miles < 1.0 {
        format!("{:.0} ft", miles * FEET_PER_MILE)
    } else {
        format!("{miles:.1} mi")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> PlayerProfile {
        PlayerProfile {
            id: id.to_string(),
            full_name: format!("Player {id}"),
            location: None,
            age: None,
            current_rating: None,
            playing_style: None,
            coordinates: None,
        }
    }

    #[test]
    fn perfect_match_caps_at_one() {
        let mut a = profile("a");
        a.location = Some("Austin, TX".to_string());
        a.age = Some(30);
        a.current_rating = Some(4.0);
        a.playing_style = Some(PlayingStyle::Aggressive);
        let mut b = a.clone();
        b.id = "b".to_string();
        b.location = Some("austin".to_string());

        let compat = compatibility_between(&a, &b);
        assert_eq!(compat.score, 1.0);
        assert_eq!(compat.factors, vec!["location", "age", "skill_level", "playing_style"]);
    }

    #[test]
    fn partial_factors_use_lower_tiers() {
        let mut a = profile("a");
        a.age = Some(25);
        a.current_rating = Some(3.0);
        a.playing_style = Some(PlayingStyle::Defensive);
        let mut b = profile("b");
        b.age = Some(33);
        b.current_rating = Some(4.0);
        b.playing_style = Some(PlayingStyle::Aggressive);

        let compat = compatibility_between(&a, &b);
        assert!((compat.score - 0.45).abs() < 1e-9, "got {}", compat.score);
    }

    #[test]
    fn recommendations_filter_and_sort() {
        let mut me = profile("me");
        me.current_rating = Some(4.0);
        me.age = Some(30);

        let mut close = profile("close");
        close.current_rating = Some(4.0);
        close.age = Some(31);
        let mut weak = profile("weak");
        weak.current_rating = Some(5.5);
        let mut mid = profile("mid");
        mid.current_rating = Some(4.5);

        let recs = recommend_players(&me, &[weak, mid, close, me.clone()], 10);
        let ids: Vec<_> = recs.iter().map(|r| r.recommended_player_id.as_str()).collect();
        assert_eq!(ids, vec!["close"]);
        assert_eq!(
            recs[0].reasoning,
            "Player close is a great match because you're similar in age, you have similar skill levels."
        );
    }

    #[test]
    fn parses_style_aliases() {
        assert_eq!(PlayingStyle::parse("All-Court"), Some(PlayingStyle::AllCourt));
        assert_eq!(PlayingStyle::parse("serve and volley"), Some(PlayingStyle::ServeAndVolley));
        assert_eq!(PlayingStyle::parse("moonballer"), None);
    }

    #[test]
    fn haversine_matches_known_distance() {
        // Midtown Manhattan to Brooklyn Bridge Park, roughly 3.8 miles
        let midtown = GeoPoint { lat: 40.7549, lng: -73.9840 };
        let brooklyn = GeoPoint { lat: 40.7002, lng: -73.9967 };
        let miles = haversine_miles(midtown, brooklyn);
        assert!((3.5..4.5).contains(&miles), "got {miles}");
        assert_eq!(haversine_miles(midtown, midtown), 0.0);
    }

    #[test]
    fn formats_short_distances_in_feet() {
        assert_eq!(format_distance(0.5), "2640 ft");
        assert_eq!(format_distance(3.27), "3.3 mi");
    }
}
