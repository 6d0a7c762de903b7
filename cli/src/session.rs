//! A simulation session: one client and one image fetcher shared by every
//! command, so repeated requests within the freshness window and repeated
//! NFT previews are served from cache.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use txsim_core::{
    chain_id, classify, validate_call_data, ApiKey, NftImageFetcher, NftPreview, SimApi,
    SimulationClient, SimulationRequest,
};
use txsim_http::HttpSimApi;

use crate::config::TxsimConfig;
use crate::render;
use crate::{DecodeArgs, SimulateArgs};

/// One line of `txsim shell` input.
#[derive(Parser)]
#[command(name = "txsim>", no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    /// List supported chains and their ids
    Chains,
    /// Decode call data using an ABI JSON file
    Decode(DecodeArgs),
    /// Simulate a transaction
    Simulate(SimulateArgs),
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

pub struct Session {
    client: SimulationClient,
    fetcher: NftImageFetcher,
}

impl Session {
    pub fn new(api: Arc<dyn SimApi>, simulation_ttl: Duration) -> Self {
        Self {
            client: SimulationClient::with_ttl(api.clone(), simulation_ttl),
            fetcher: NftImageFetcher::new(api),
        }
    }

    /// Session against the Dune SIM endpoints named in `config`.
    pub fn from_config(config: &TxsimConfig) -> Result<Self> {
        let api: Arc<dyn SimApi> = Arc::new(HttpSimApi::new(config.http())?);
        Ok(Self::new(api, config.simulation_ttl()))
    }

    /// Run one simulation and print the report.
    ///
    /// Input problems are `Err`. A transport failure prints "API Error" and
    /// yields exit code 1; an in-band simulation error yields 2.
    pub async fn simulate<W: Write>(&self, args: &SimulateArgs, out: &mut W) -> Result<ExitCode> {
        let api_key = ApiKey::new(args.api_key.clone().unwrap_or_default());
        if api_key.is_empty() {
            bail!("an API key is required (--api-key or TXSIM_API_KEY)");
        }
        validate_call_data(&args.calldata)?;
        let chain_id = chain_id(&args.chain)?;

        // failures are logged by the decoder and shown in the report
        let decoded = match &args.abi {
            Some(path) => Some(txsim_evm::decode(&args.calldata, &read_abi(path)?)),
            None => None,
        };

        let req = SimulationRequest::new(api_key.clone(), args.calldata.as_str(), chain_id);
        tracing::info!(chain = %args.chain, chain_id, "simulating");

        let result = match self.client.simulate(&req).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "simulation request failed");
                eprintln!("💥 API Error: {e}");
                return Ok(ExitCode::from(1));
            }
        };

        if let Some(message) = result.error_message() {
            if args.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&json!({ "error": message }))?)?;
            } else {
                writeln!(out, "❌ {message}")?;
                render::footer(out)?;
            }
            return Ok(ExitCode::from(2));
        }

        let previews = self.fetcher.fetch_previews(&api_key, &result.nft_transfers).await;
        let risks = classify(&result);

        if let Some(dir) = &args.save_images {
            save_images(dir, &previews)?;
        }

        if args.json {
            let previews_json: Vec<_> = previews
                .iter()
                .map(|p| {
                    json!({
                        "contract_address": p.transfer.contract_address,
                        "token_id": p.transfer.token_id,
                        "image": p.image.as_ref().map(|img| json!({
                            "format": img.format,
                            "size": img.len(),
                        })),
                    })
                })
                .collect();
            let body = json!({
                "chain": args.chain,
                "chain_id": chain_id,
                "decoded": decoded,
                "result": result,
                "nft_previews": previews_json,
                "risks": risks,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&body)?)?;
            return Ok(ExitCode::SUCCESS);
        }

        if let Some(decoded) = &decoded {
            writeln!(out, "🔎 Decoded Call")?;
            render::decoded_call(out, decoded)?;
            writeln!(out)?;
        }
        render::report(out, &result, &previews, &risks)?;
        render::footer(out)?;

        Ok(ExitCode::SUCCESS)
    }

    /// Read commands line by line until EOF or `quit`.
    ///
    /// A failing line is reported and the session carries on.
    pub async fn run_shell<R, W>(&self, input: R, out: &mut W, prompt: bool) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        loop {
            if prompt {
                eprint!("txsim> ");
            }
            let Some(line) = lines.next_line().await.context("read command")? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parsed = match ShellLine::try_parse_from(line.split_whitespace()) {
                Ok(parsed) => parsed,
                Err(e) => {
                    writeln!(out, "{}", e.render())?;
                    continue;
                }
            };

            let outcome = match parsed.command {
                ShellCommand::Quit => break,
                ShellCommand::Chains => render::chains(&mut *out)
                    .map(|()| ExitCode::SUCCESS)
                    .map_err(anyhow::Error::from),
                ShellCommand::Decode(args) => decode(&args, &mut *out),
                ShellCommand::Simulate(args) => self.simulate(&args, &mut *out).await,
            };
            if let Err(e) = outcome {
                writeln!(out, "Error: {e:#}")?;
            }
        }
        Ok(())
    }
}

pub fn decode<W: Write>(args: &DecodeArgs, out: &mut W) -> Result<ExitCode> {
    let abi_json = read_abi(&args.abi)?;
    let decoded = txsim_evm::decode(&args.calldata, &abi_json);

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&decoded)?)?;
    } else {
        render::decoded_call(out, &decoded)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn read_abi(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read ABI file '{}'", path.display()))
}

fn save_images(dir: &Path, previews: &[NftPreview]) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("create '{}'", dir.display()))?;
    for preview in previews {
        let (Some(name), Some(img)) = (render::image_file_name(preview), &preview.image) else {
            continue;
        };
        let path = dir.join(name);
        std::fs::write(&path, &img.bytes)
            .with_context(|| format!("write '{}'", path.display()))?;
        tracing::debug!(path = %path.display(), "saved NFT image");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use txsim_core::{NftTransfer, SimulationResult, TransportError};

    /// Answers every simulation with two NFT transfers and serves PNGs.
    #[derive(Default)]
    struct CountingApi {
        simulations: AtomicUsize,
        images: AtomicUsize,
    }

    #[async_trait]
    impl SimApi for CountingApi {
        async fn simulate(&self, _req: &SimulationRequest) -> Result<SimulationResult, TransportError> {
            self.simulations.fetch_add(1, Ordering::SeqCst);
            Ok(SimulationResult {
                success: true,
                gas_used: Some(21_000),
                nft_transfers: vec![NftTransfer::new("0xnft", "1"), NftTransfer::new("0xnft", "2")],
                ..Default::default()
            })
        }

        async fn nft_image(
            &self,
            _api_key: &ApiKey,
            _contract_address: &str,
            _token_id: &str,
        ) -> Result<Option<Vec<u8>>, TransportError> {
            self.images.fetch_add(1, Ordering::SeqCst);
            Ok(Some(vec![0x89, b'P', b'N', b'G']))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn session() -> (Arc<CountingApi>, Session) {
        let api = Arc::new(CountingApi::default());
        let session = Session::new(api.clone(), Duration::from_secs(300));
        (api, session)
    }

    fn args(calldata: &str, chain: &str, api_key: &str) -> SimulateArgs {
        SimulateArgs {
            calldata: calldata.into(),
            chain: chain.into(),
            abi: None,
            api_key: Some(api_key.into()),
            json: false,
            save_images: None,
        }
    }

    async fn shell(session: &Session, input: &str) -> String {
        let mut out = Vec::new();
        session.run_shell(input.as_bytes(), &mut out, false).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("txsim-session-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn repeated_lines_are_served_from_cache() {
        let (api, session) = session();
        let out = shell(
            &session,
            "simulate --calldata 0x01 --api-key k\n\
             simulate --calldata 0x01 --api-key k\n",
        )
        .await;

        assert_eq!(api.simulations.load(Ordering::SeqCst), 1);
        assert_eq!(api.images.load(Ordering::SeqCst), 2);
        assert_eq!(out.matches("Gas Used: 21000").count(), 2);
    }

    #[tokio::test]
    async fn different_chains_are_separate_requests() {
        let (api, session) = session();
        shell(
            &session,
            "simulate --calldata 0x01 --api-key k\n\
             simulate --calldata 0x01 --api-key k --chain Base\n",
        )
        .await;
        assert_eq!(api.simulations.load(Ordering::SeqCst), 2);
        // images do not depend on the request
        assert_eq!(api.images.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn bad_lines_do_not_end_the_session() {
        let (api, session) = session();
        let out = shell(
            &session,
            "# comment\n\
             frobnicate\n\
             simulate --calldata a9059cbb --api-key k\n\
             chains\n\
             quit\n\
             simulate --calldata 0x01 --api-key k\n",
        )
        .await;

        assert!(out.contains("Error: Transaction data must start with '0x'"));
        assert!(out.contains("Aurora"));
        assert_eq!(api.simulations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn input_errors_never_reach_the_service() {
        let (api, session) = session();
        let mut out = Vec::new();

        let err = session.simulate(&args("a9059cbb", "Ethereum", "k"), &mut out).await.unwrap_err();
        assert_eq!(err.to_string(), "Transaction data must start with '0x'");

        assert!(session.simulate(&args("0x", "Ethereum", "  "), &mut out).await.is_err());

        let err = session.simulate(&args("0x", "Atlantis", "k"), &mut out).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown chain: Atlantis");

        assert_eq!(api.simulations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_decode_is_reported_once() {
        let (_, session) = session();
        let abi = temp_file("erc20.json", include_str!("../../fixtures/abi/erc20.json"));
        let mut a = args("0xdeadbeef", "Ethereum", "k");
        a.abi = Some(abi);

        let mut out = Vec::new();
        session.simulate(&a, &mut out).await.unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches("Could not decode").count(), 1);
        assert!(out.contains("Raw: 0xdeadbeef"));
    }

    #[tokio::test]
    async fn json_output_is_one_document() {
        let (_, session) = session();
        let mut a = args("0x01", "Polygon", "k");
        a.json = true;

        let mut out = Vec::new();
        session.simulate(&a, &mut out).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(v["chain_id"], 137);
        assert_eq!(v["nft_previews"][0]["image"]["format"], "png");
        assert_eq!(v["risks"], json!([]));
    }
}
