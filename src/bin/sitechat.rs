use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;
use sitechat::telemetry::init_tracing;
use sitechat::{
    AskResponse, EncoderArgs, HttpRenderer, PipelineArgs, ProviderArgs, ScrapeError, SiteChat,
};

#[derive(Parser, Debug)]
#[command(
    name = "sitechat",
    about = "Crawl a website and answer questions grounded in its content"
)]
struct ChatCli {
    /// Website to crawl
    #[arg(long)]
    url: String,

    /// API key for the answering model
    #[arg(long, env = "SITECHAT_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Question to ask; repeat for several. Reads stdin when omitted
    #[arg(long = "query")]
    queries: Vec<String>,

    #[command(flatten)]
    pipeline: PipelineArgs,

    #[command(flatten)]
    encoder: EncoderArgs,

    #[command(flatten)]
    provider: ProviderArgs,
}

fn main() -> Result<()> {
    let cli = ChatCli::parse();
    init_tracing()?;

    let controls = cli.pipeline.build_controls();
    let renderer = HttpRenderer::new(&controls.fetch).context("failed to build HTTP renderer")?;
    let encoder = cli.encoder.build_encoder()?;
    let composer = cli.provider.build_composer()?;
    let chat = SiteChat::new(Box::new(renderer), encoder, composer, controls);

    let summary = match chat.scrape(&cli.url, cli.pipeline.max_pages, &cli.api_key) {
        Ok(summary) => summary,
        Err(err @ ScrapeError::Index(_)) => {
            return Err(anyhow::Error::new(err).context("index build failed"))
        }
        Err(err) => bail!("{err}"),
    };
    println!("{}", summary.message());

    if !cli.queries.is_empty() {
        for query in &cli.queries {
            answer(&chat, query)?;
        }
        return Ok(());
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush().context("failed to flush stdout")?;
        let mut line = String::new();
        if stdin
            .lock()
            .read_line(&mut line)
            .context("failed to read question")?
            == 0
        {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        answer(&chat, &line)?;
    }
    Ok(())
}

fn answer(chat: &SiteChat, query: &str) -> Result<()> {
    let response = chat.ask(query)?;
    print_response(&response);
    Ok(())
}

fn print_response(response: &AskResponse) {
    println!("--- Answer ---\n{}", response.answer.trim());
    if response.sources.is_empty() {
        return;
    }
    println!("--- Sources ---");
    for (rank, source) in response.sources.iter().enumerate() {
        println!(
            "[{}] {} ({}) score {:.3}\n    {}",
            rank + 1,
            source.title,
            source.url,
            source.score,
            source.snippet
        );
    }
}
