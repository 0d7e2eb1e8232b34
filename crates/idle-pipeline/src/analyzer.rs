//! Deployment targets, performance scoring and ratings.

use idle_core::{rate, Decimal, Rate};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

/// Most recent deployments kept in the history.
pub const HISTORY_CAP: usize = 200;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Web,
    Desktop,
    Mobile,
    Embedded,
    Quantum,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Web,
        Platform::Desktop,
        Platform::Mobile,
        Platform::Embedded,
        Platform::Quantum,
    ];

    pub fn multiplier(self) -> Rate {
        match self {
            Platform::Web => dec!(1),
            Platform::Desktop => dec!(1.5),
            Platform::Mobile => dec!(2),
            Platform::Embedded => dec!(3),
            Platform::Quantum => dec!(10),
        }
    }

    /// Cumulative score across all platforms that unlocks this one.
    /// `None` means always available.
    pub fn unlock_threshold(self) -> Option<Decimal> {
        match self {
            Platform::Web => None,
            Platform::Desktop => Some(Decimal::from(10_000u64)),
            Platform::Mobile => Some(Decimal::from(100_000u64)),
            Platform::Embedded => Some(Decimal::from(1_000_000u64)),
            Platform::Quantum => Some(Decimal::from(1_000_000_000u64)),
        }
    }

    /// Prestige level that unlocks this platform regardless of score.
    pub fn requires_prestige(self) -> Option<u64> {
        match self {
            Platform::Quantum => Some(3),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Platform::Web => "web",
            Platform::Desktop => "desktop",
            Platform::Mobile => "mobile",
            Platform::Embedded => "embedded",
            Platform::Quantum => "quantum",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Letter grade of an average score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    D,
    C,
    B,
    A,
    S,
    #[serde(rename = "S+")]
    SPlus,
}

impl Rating {
    /// Bands checked from the top: 10000, 5000, 2000, 1000, 500.
    pub fn for_score(score: &Decimal) -> Self {
        const BANDS: [(u64, Rating); 5] = [
            (10_000, Rating::SPlus),
            (5_000, Rating::S),
            (2_000, Rating::A),
            (1_000, Rating::B),
            (500, Rating::C),
        ];
        BANDS
            .iter()
            .find(|(floor, _)| score >= floor)
            .map(|(_, r)| *r)
            .unwrap_or(Rating::D)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rating::SPlus => "S+",
            Rating::S => "S",
            Rating::A => "A",
            Rating::B => "B",
            Rating::C => "C",
            Rating::D => "D",
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformStats {
    pub deployments: u64,
    pub cumulative: Decimal,
    pub best: Decimal,
    pub average: Decimal,
}

impl PlatformStats {
    fn record(&mut self, score: &Decimal) {
        self.deployments += 1;
        self.cumulative += score;
        if score > &self.best {
            self.best = score.clone();
        }
        self.average = &self.cumulative / &Decimal::from(self.deployments);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub platform: Platform,
    pub score: Decimal,
    pub rating: Rating,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceAnalyzer {
    pub platform: Platform,
    pub stats: BTreeMap<Platform, PlatformStats>,
    pub history: VecDeque<DeploymentRecord>,
}

impl PerformanceAnalyzer {
    pub fn total_deployments(&self) -> u64 {
        self.stats.values().map(|s| s.deployments).sum()
    }

    /// Score accumulated over every platform.
    pub fn cumulative_score(&self) -> Decimal {
        self.stats.values().map(|s| &s.cumulative).sum()
    }

    /// All-time average over every deployment, zero before the first.
    pub fn average_score(&self) -> Decimal {
        self.cumulative_score()
            .checked_div(&Decimal::from(self.total_deployments()))
            .unwrap_or_default()
    }

    pub fn rating(&self) -> Rating {
        Rating::for_score(&self.average_score())
    }

    /// `1 + 0.01 * total deployments`.
    pub fn experience_bonus(&self) -> Decimal {
        Decimal::one() + rate(dec!(0.01)) * Decimal::from(self.total_deployments())
    }

    /// `optimized * 0.1 * platform multiplier * experience bonus` for the
    /// current platform.
    pub fn analyze(&self, optimized: &Decimal) -> Decimal {
        optimized
            * &rate(dec!(0.1))
            * rate(self.platform.multiplier())
            * self.experience_bonus()
    }

    pub fn is_unlocked(&self, platform: Platform, prestige_level: u64) -> bool {
        let by_score = match platform.unlock_threshold() {
            None => true,
            Some(threshold) => self.cumulative_score() >= threshold,
        };
        let by_prestige = platform
            .requires_prestige()
            .is_some_and(|needed| prestige_level >= needed);
        by_score || by_prestige
    }

    /// Record a deployment of `score` on the current platform.
    pub fn record(&mut self, score: Decimal) -> DeploymentRecord {
        self.stats.entry(self.platform).or_default().record(&score);
        let record = DeploymentRecord {
            platform: self.platform,
            rating: Rating::for_score(&score),
            score,
        };
        self.history.push_back(record.clone());
        while self.history.len() > HISTORY_CAP {
            self.history.pop_front();
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn rating_bands() {
        assert_eq!(Rating::for_score(&d("10000")), Rating::SPlus);
        assert_eq!(Rating::for_score(&d("9999.99")), Rating::S);
        assert_eq!(Rating::for_score(&d("2000")), Rating::A);
        assert_eq!(Rating::for_score(&d("1000")), Rating::B);
        assert_eq!(Rating::for_score(&d("500")), Rating::C);
        assert_eq!(Rating::for_score(&d("499")), Rating::D);
        assert_eq!(Rating::SPlus.to_string(), "S+");
    }

    #[test]
    fn analyze_uses_platform_and_experience() {
        let mut a = PerformanceAnalyzer::default();
        assert_eq!(a.analyze(&d("1000")), d("100"));
        a.platform = Platform::Mobile;
        a.stats.insert(
            Platform::Web,
            PlatformStats {
                deployments: 10,
                ..PlatformStats::default()
            },
        );
        // 1000 * 0.1 * 2 * 1.1
        assert_eq!(a.analyze(&d("1000")), d("220"));
    }

    #[test]
    fn platform_unlocks() {
        let mut a = PerformanceAnalyzer::default();
        assert!(a.is_unlocked(Platform::Web, 0));
        assert!(!a.is_unlocked(Platform::Desktop, 0));
        assert!(!a.is_unlocked(Platform::Quantum, 2));
        assert!(a.is_unlocked(Platform::Quantum, 3));
        a.record(d("10000"));
        assert!(a.is_unlocked(Platform::Desktop, 0));
        assert!(!a.is_unlocked(Platform::Mobile, 0));
    }

    #[test]
    fn stats_and_average() {
        let mut a = PerformanceAnalyzer::default();
        assert!(a.average_score().is_zero());
        assert_eq!(a.rating(), Rating::D);
        a.record(d("600"));
        a.record(d("1400"));
        let web = &a.stats[&Platform::Web];
        assert_eq!(web.deployments, 2);
        assert_eq!(web.best, d("1400"));
        assert_eq!(web.average, d("1000"));
        assert_eq!(a.average_score(), d("1000"));
        assert_eq!(a.rating(), Rating::B);
        assert_eq!(a.history[0].rating, Rating::C);
    }

    #[test]
    fn history_is_fifo_capped() {
        let mut a = PerformanceAnalyzer::default();
        for i in 0..(HISTORY_CAP as u64 + 5) {
            a.record(Decimal::from(i));
        }
        assert_eq!(a.history.len(), HISTORY_CAP);
        assert_eq!(a.history.front().map(|r| r.score.clone()), Some(Decimal::from(5u64)));
        assert_eq!(a.total_deployments(), HISTORY_CAP as u64 + 5);
    }
}
