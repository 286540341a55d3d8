use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Índices de mercado soportados. El string "de cable" es el nombre
/// tal como lo publica la bolsa (ej: "NIFTY 50").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexSelector {
    #[serde(rename = "NIFTY 50")]
    Nifty50,
    #[serde(rename = "SENSEX")]
    Sensex,
    #[serde(rename = "NIFTY Bank")]
    NiftyBank,
    #[serde(rename = "NIFTY IT")]
    NiftyIt,
    #[serde(rename = "NIFTY Auto")]
    NiftyAuto,
    #[serde(rename = "NIFTY Pharma")]
    NiftyPharma,
    #[serde(rename = "NIFTY FMCG")]
    NiftyFmcg,
    #[serde(rename = "NIFTY Metal")]
    NiftyMetal,
    #[serde(rename = "NIFTY Midcap 100")]
    NiftyMidcap,
    #[serde(rename = "NIFTY Smallcap 100")]
    NiftySmallcap,
}

impl IndexSelector {
    pub const ALL: [IndexSelector; 10] = [
        IndexSelector::Nifty50,
        IndexSelector::Sensex,
        IndexSelector::NiftyBank,
        IndexSelector::NiftyIt,
        IndexSelector::NiftyAuto,
        IndexSelector::NiftyPharma,
        IndexSelector::NiftyFmcg,
        IndexSelector::NiftyMetal,
        IndexSelector::NiftyMidcap,
        IndexSelector::NiftySmallcap,
    ];

    /// Índices que se muestran en el overview del mercado.
    pub const OVERVIEW: [IndexSelector; 3] = [
        IndexSelector::Nifty50,
        IndexSelector::Sensex,
        IndexSelector::NiftyBank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexSelector::Nifty50 => "NIFTY 50",
            IndexSelector::Sensex => "SENSEX",
            IndexSelector::NiftyBank => "NIFTY Bank",
            IndexSelector::NiftyIt => "NIFTY IT",
            IndexSelector::NiftyAuto => "NIFTY Auto",
            IndexSelector::NiftyPharma => "NIFTY Pharma",
            IndexSelector::NiftyFmcg => "NIFTY FMCG",
            IndexSelector::NiftyMetal => "NIFTY Metal",
            IndexSelector::NiftyMidcap => "NIFTY Midcap 100",
            IndexSelector::NiftySmallcap => "NIFTY Smallcap 100",
        }
    }
}

impl fmt::Display for IndexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IndexSelector::ALL
            .into_iter()
            .find(|idx| idx.as_str() == s)
            .ok_or_else(|| SelectorError::UnknownIndex(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Hinglish,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Hindi, Language::Hinglish];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Hinglish => "Hinglish",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| SelectorError::UnknownLanguage(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("índice desconocido '{0}'")]
    UnknownIndex(String),
    #[error("idioma desconocido '{0}'")]
    UnknownLanguage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_from_str_acepta_los_diez_valores() {
        for idx in IndexSelector::ALL {
            assert_eq!(idx.as_str().parse::<IndexSelector>().unwrap(), idx);
        }
    }

    #[test]
    fn index_from_str_rechaza_desconocidos() {
        let err = "NASDAQ".parse::<IndexSelector>().unwrap_err();
        assert_eq!(err, SelectorError::UnknownIndex("NASDAQ".to_string()));
        // sensible a mayúsculas, igual que el enum original
        assert!("nifty 50".parse::<IndexSelector>().is_err());
    }

    #[test]
    fn serde_usa_el_nombre_de_la_bolsa() {
        let v = serde_json::to_value(IndexSelector::NiftyMidcap).unwrap();
        assert_eq!(v, serde_json::json!("NIFTY Midcap 100"));

        let lang: Language = serde_json::from_str("\"Hinglish\"").unwrap();
        assert_eq!(lang, Language::Hinglish);
    }

    #[test]
    fn language_por_defecto_es_english() {
        assert_eq!(Language::default(), Language::English);
        assert!("French".parse::<Language>().is_err());
    }
}
