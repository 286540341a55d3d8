//! Generador de datos de mercado sintéticos.
//!
//! Todo sale de un único `StdRng`; con `MarketFacts::seeded` los
//! valores son reproducibles (lo usan los tests).

use chrono::Utc;
use common::{
    CollectedData, EconomicData, IndexQuote, IndexSelector, Indicators, KeyLevels, Language,
    Podcast, Script, SectorPerformance, TrendAnalysis, TrendSummary,
};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

pub const SOURCES: [&str; 6] = [
    "NSE India",
    "BSE India",
    "RBI",
    "SEBI",
    "Ministry of Finance",
    "MOSPI",
];

pub const SECTORS: [&str; 8] = [
    "Banking", "IT", "Auto", "Pharma", "FMCG", "Metal", "Realty", "Energy",
];

const OUTLOOKS: [&str; 3] = ["Positive", "Neutral", "Negative"];

/// Banda de precios (mín, máx) de cada índice.
pub fn price_band(index: IndexSelector) -> (f64, f64) {
    match index {
        IndexSelector::Nifty50 => (24500.0, 25500.0),
        IndexSelector::Sensex => (80000.0, 85000.0),
        IndexSelector::NiftyBank => (51000.0, 54000.0),
        IndexSelector::NiftyIt => (38000.0, 40000.0),
        IndexSelector::NiftyAuto => (21000.0, 22000.0),
        IndexSelector::NiftyPharma => (18500.0, 19500.0),
        IndexSelector::NiftyFmcg => (55000.0, 58000.0),
        IndexSelector::NiftyMetal => (8700.0, 9200.0),
        IndexSelector::NiftyMidcap => (56000.0, 58000.0),
        IndexSelector::NiftySmallcap => (18000.0, 19000.0),
    }
}

pub struct MarketFacts {
    rng: Mutex<StdRng>,
}

impl MarketFacts {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    pub fn quote(&self, index: IndexSelector) -> IndexQuote {
        let (low, high) = price_band(index);

        self.with_rng(|rng| {
            let price = rng.gen_range(low..high);
            let change = rng.gen_range(-800.0..800.0);
            let change_percent = change / price * 100.0;

            IndexQuote {
                symbol: index,
                price: round2(price),
                change: round2(change),
                change_percent: round2(change_percent),
                volume: rng.gen_range(1_000_000..=5_000_000),
                high: round2(price + rng.gen_range(100.0..500.0)),
                low: round2(price - rng.gen_range(100.0..500.0)),
                open: round2(price - change + rng.gen_range(-100.0..100.0)),
                previous_close: round2(price - change),
                status: "Live".to_string(),
                timestamp: Utc::now(),
                indicators: Indicators {
                    rsi: round1(rng.gen_range(30.0..70.0)),
                    macd: if change > 0.0 { "Bullish" } else { "Bearish" }.to_string(),
                    support: round2(price * 0.98),
                    resistance: round2(price * 1.02),
                },
            }
        })
    }

    pub fn trend(&self, index: IndexSelector) -> TrendAnalysis {
        let quote = self.quote(index);
        let high_volatility = self.with_rng(|rng| rng.gen_bool(0.3));

        let analysis = TrendSummary {
            trend: if quote.change > 0.0 { "Bullish" } else { "Bearish" }.to_string(),
            momentum: if quote.change_percent.abs() > 1.0 {
                "Strong"
            } else {
                "Weak"
            }
            .to_string(),
            volatility: if high_volatility { "High" } else { "Normal" }.to_string(),
            key_levels: KeyLevels {
                support: round2(quote.price * 0.99),
                resistance: round2(quote.price * 1.01),
            },
        };

        TrendAnalysis { quote, analysis }
    }

    pub fn collection(&self) -> CollectedData {
        self.with_rng(|rng| {
            let sectors = SECTORS
                .iter()
                .map(|name| {
                    let sign = if rng.gen_bool(0.5) { "+" } else { "" };
                    let perf: f64 = rng.gen_range(0.5..3.0);
                    SectorPerformance {
                        name: name.to_string(),
                        performance: format!("{}{:.1}%", sign, perf),
                        outlook: OUTLOOKS
                            .choose(rng)
                            .copied()
                            .unwrap_or("Neutral")
                            .to_string(),
                    }
                })
                .collect();

            CollectedData {
                sources: SOURCES.iter().map(|s| s.to_string()).collect(),
                sectors,
                economic_data: EconomicData {
                    repo_rate: "6.50%".to_string(),
                    inflation: format!("{:.1}%", rng.gen_range(4.0..5.5)),
                    gdp_growth: format!("{:.1}%", rng.gen_range(6.5..7.5)),
                    fiscal_deficit: format!("{:.1}%", rng.gen_range(5.5..6.5)),
                },
                timestamp: Utc::now(),
            }
        })
    }

    /// Arma el guion a partir de las salidas de las dos primeras etapas.
    /// No usa aleatoriedad.
    pub fn script(
        &self,
        index: IndexSelector,
        language: Language,
        trend: &TrendAnalysis,
        collected: &CollectedData,
    ) -> Script {
        let now = Utc::now();
        let date = now.format("%d %B %Y");
        let q = &trend.quote;
        let price = format_inr(q.price);
        let gained = q.change > 0.0;
        let pct = q.change_percent.abs();
        let top1 = sector_name(collected, 0);
        let top2 = sector_name(collected, 1);
        let sentiment = &trend.analysis.trend;
        let repo = &collected.economic_data.repo_rate;

        let (title, intro, analysis, sectors, outlook, word_count) = match language {
            Language::English => (
                format!("{} Market Analysis - {}", index, date),
                format!(
                    "Welcome to TrendCast India. Today, {} is trading at ₹{}, showing a {} of {:.2} points.",
                    index,
                    price,
                    if gained { "gain" } else { "loss" },
                    q.change.abs()
                ),
                format!(
                    "The index moved {:.2}% with RSI at {}. Key support at ₹{}.",
                    pct,
                    q.indicators.rsi,
                    format_inr(trend.analysis.key_levels.support)
                ),
                format!("Top performing sectors include {} and {}.", top1, top2),
                format!(
                    "Market sentiment is {}. RBI maintains repo rate at {}.",
                    sentiment, repo
                ),
                185,
            ),
            Language::Hindi => (
                format!("{} बाजार विश्लेषण - {}", index, date),
                format!(
                    "ट्रेंडकास्ट इंडिया में आपका स्वागत है। आज {} ₹{} पर कारोबार कर रहा है।",
                    index, price
                ),
                format!(
                    "यह {:.2}% का {} दिखा रहा है।",
                    pct,
                    if gained { "लाभ" } else { "नुकसान" }
                ),
                format!(
                    "शीर्ष performing sectors में {} और {} शामिल हैं।",
                    top1, top2
                ),
                format!("बाजार का रुख {} है।", sentiment),
                165,
            ),
            Language::Hinglish => (
                format!("{} Market Analysis - {}", index, date),
                format!(
                    "Namaste and welcome to TrendCast India. Aaj {} ₹{} par trade kar raha hai.",
                    index, price
                ),
                format!(
                    "Index ne {:.2}% {} dikhaya. RSI {} par hai.",
                    pct,
                    if gained { "gain" } else { "loss" },
                    q.indicators.rsi
                ),
                format!(
                    "Top sectors mein {} aur {} accha perform kar rahe hain.",
                    top1, top2
                ),
                format!(
                    "Market ka sentiment {} hai. RBI repo rate {} par rakha hai.",
                    sentiment, repo
                ),
                175,
            ),
        };

        Script {
            title,
            intro,
            analysis,
            sectors,
            outlook,
            word_count,
            language,
            duration_estimate: "3-4 minutes".to_string(),
            timestamp: now,
        }
    }

    /// Metadatos del "podcast". No se genera audio: la URL apunta a un
    /// archivo que el servicio no sirve.
    pub fn podcast(&self, language: Language, script: &Script) -> Podcast {
        let now = Utc::now();
        let voice = match language {
            Language::English => "Indian English Male",
            Language::Hindi => "Hindi Female",
            Language::Hinglish => "Bilingual Voice",
        };

        Podcast {
            title: script.title.clone(),
            audio_url: format!("/static/audio/podcast_{}.mp3", now.format("%Y%m%d_%H%M%S")),
            duration: "3:45".to_string(),
            file_size: "2.8 MB".to_string(),
            format: "MP3".to_string(),
            quality: "128kbps".to_string(),
            voice: voice.to_string(),
            timestamp: now,
        }
    }
}

fn sector_name(collected: &CollectedData, i: usize) -> &str {
    collected
        .sectors
        .get(i)
        .map(|s| s.name.as_str())
        .unwrap_or("N/A")
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// 24876.5 -> "24,876.50"
pub fn format_inr(v: f64) -> String {
    let s = format!("{:.2}", v.abs());
    let (int_part, frac) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if v < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}
