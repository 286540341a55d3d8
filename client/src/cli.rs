use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use common::{
    AnalysesList, AnalysisRequest, AnalysisStarted, ErrorBody, HealthResponse, JobRecord,
    MarketOverview, StageStatus,
};
use reqwest::{Client, Response};
use std::{env, time::Duration};

/// - En Docker: TRENDCAST_URL=http://server:8000
/// - Local: default http://localhost:8000
fn server_base_url() -> String {
    env::var("TRENDCAST_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

#[derive(Parser)]
#[command(name = "trendcast")]
#[command(about = "CLI simple para hablar con el servidor de TrendCast")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lanza un análisis nuevo
    Submit {
        /// Índice, ej: "NIFTY 50", "SENSEX", "NIFTY Bank"
        #[arg(value_name = "INDICE")]
        index: String,

        /// English, Hindi o Hinglish
        #[arg(long, default_value = "English")]
        language: String,
    },
    /// Consulta el estado de un análisis
    Status {
        #[arg(value_name = "ANALYSIS_ID")]
        id: String,
    },
    /// Consulta un análisis cada cierto tiempo hasta que termine
    Watch {
        #[arg(value_name = "ANALYSIS_ID")]
        id: String,

        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
    /// Últimos análisis (del más nuevo al más viejo)
    List,
    /// Cotizaciones de NIFTY 50, SENSEX y NIFTY Bank
    Overview,
    Health,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = server_base_url();

    match cli.command {
        Commands::Submit { index, language } => {
            let url = format!("{}/api/analyze", base_url);
            let req = AnalysisRequest {
                index,
                language: Some(language),
            };
            let resp = client.post(&url).json(&req).send().await?;

            let started: AnalysisStarted = ok_json(resp).await?;
            println!("Análisis creado:");
            println!("  id: {}", started.analysis_id);
            println!("  estado: {}", started.status);
            println!("  {}", started.message);
        }

        Commands::Status { id } => {
            let url = format!("{}/api/analysis/{}", base_url, id);
            let resp = client.get(&url).send().await?;
            let job: JobRecord = ok_json(resp).await?;
            print_job(&job);
        }

        Commands::Watch { id, interval_ms } => {
            let url = format!("{}/api/analysis/{}", base_url, id);
            let mut last_line = String::new();
            loop {
                let resp = client.get(&url).send().await?;
                let job: JobRecord = ok_json(resp).await?;

                let line = progress_line(&job);
                if line != last_line {
                    println!("{}", line);
                    last_line = line;
                }

                if job.is_finished() {
                    print_job(&job);
                    break;
                }
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            }
        }

        Commands::List => {
            let url = format!("{}/api/analyses", base_url);
            let resp = client.get(&url).send().await?;
            let list: AnalysesList = ok_json(resp).await?;
            if list.analyses.is_empty() {
                println!("No hay análisis todavía.");
            } else {
                println!("{} análisis:", list.count);
                for job in &list.analyses {
                    println!(
                        "  {}  {:<18} {:<8} {:?} ({}%)",
                        job.id,
                        job.index.as_str(),
                        job.language.as_str(),
                        job.status,
                        job.overall_progress()
                    );
                }
            }
        }

        Commands::Overview => {
            let url = format!("{}/api/market/overview", base_url);
            let resp = client.get(&url).send().await?;
            let ov: MarketOverview = ok_json(resp).await?;
            println!("Mercado: {} ({})", ov.market_status, ov.timestamp);
            for (idx, q) in &ov.indices {
                println!(
                    "  {:<12} ₹{:>10.2}  {:>+8.2} ({:>+5.2}%)  RSI {:.1}  {}",
                    idx.as_str(),
                    q.price,
                    q.change,
                    q.change_percent,
                    q.indicators.rsi,
                    q.indicators.macd
                );
            }
        }

        Commands::Health => {
            let url = format!("{}/api/health", base_url);
            let resp = client.get(&url).send().await?;
            let h: HealthResponse = ok_json(resp).await?;
            println!("{} {} v{}: {}", h.service, h.timestamp, h.version, h.status);
        }
    }

    Ok(())
}

/// Parsea el cuerpo si la respuesta fue 2xx; si no, arma un error con el
/// `ErrorBody` del servidor (o al menos el status).
async fn ok_json<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }
    match resp.json::<ErrorBody>().await {
        Ok(body) => bail!("{} ({}): {}", body.error, status, body.detail),
        Err(_) => bail!("el servidor respondió {}", status),
    }
}

fn progress_line(job: &JobRecord) -> String {
    let stages: Vec<String> = job
        .agents
        .iter()
        .map(|(stage, st)| format!("{}={}", stage, stage_mark(st.status, st.progress)))
        .collect();
    format!("[{:>3}%] {}", job.overall_progress(), stages.join(" "))
}

fn stage_mark(status: StageStatus, progress: u8) -> String {
    match status {
        StageStatus::Idle => "-".to_string(),
        StageStatus::Running => format!("{}%", progress),
        StageStatus::Completed => "ok".to_string(),
        StageStatus::Failed => "FALLÓ".to_string(),
    }
}

fn print_job(job: &JobRecord) {
    println!("Análisis:");
    println!("  id: {}", job.id);
    println!("  índice: {}", job.index);
    println!("  idioma: {}", job.language);
    println!("  estado: {:?}", job.status);
    println!("  progreso: {}%", job.overall_progress());
    for (stage, st) in job.agents.iter() {
        println!(
            "    {:<14} {:<10} {:>3}%",
            stage.wire_name(),
            format!("{:?}", st.status),
            st.progress
        );
    }
    println!("  iniciado: {}", job.started_at);
    if let Some(ref done) = job.completed_at {
        println!("  finalizado: {}", done);
    }
    if let Some(ref err) = job.error {
        println!("  error: {}", err);
    }
    if let Some(common::StageOutput::Podcast(ref p)) = job.agents.packaging.data {
        println!("  podcast: {} ({}, {})", p.audio_url, p.duration, p.voice);
    }
}
