use anyhow::Context;
use campaign_graph::config::cli::Command;
use campaign_graph::domain::forms::{
    CampaignForm, ClientForm, ContractForm, PlacementForm, ProgramForm, UploadForm, UploadedFile,
};
use campaign_graph::utils::error::ErrorSeverity;
use campaign_graph::utils::{logger, validation::Validate};
use campaign_graph::{
    AppConfig, CliConfig, ConfiguredArtifactStore, GraphStore, Result, WorkflowSettings, Workflows,
};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;

type App = Workflows<ConfiguredArtifactStore>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting campaign-graph CLI");

    // 載入配置
    let mut config = match &cli.config {
        Some(path) => match AppConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => AppConfig::default(),
    };
    cli.apply_overrides(&mut config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }
    if cli.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    let store = Arc::new(GraphStore::from_config(&config).context("failed to open graph store")?);
    let artifacts = ConfiguredArtifactStore::from_config(&config.artifact_store)
        .await
        .context("failed to initialise artifact store")?;
    let app = Workflows::new(store, artifacts, WorkflowSettings::from_config(&config));

    match dispatch(&app, cli.command).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            tracing::error!(
                "❌ Operation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn render<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

async fn dispatch(app: &App, command: Command) -> Result<String> {
    match command {
        Command::ListClients => render(&app.list_clients().await),
        Command::CreateClient {
            pharma,
            brand,
            agency,
            indication,
        } => render(
            &app.create_client(ClientForm {
                pharma,
                brand,
                agency,
                indication,
            })
            .await?,
        ),
        Command::ListContracts => render(&app.list_contracts().await),
        Command::ContractChoices => render(&app.contract_form_choices().await),
        Command::ShowContract { contract_id } => render(&app.contract_detail(contract_id).await?),
        Command::CreateContract {
            name,
            client_id,
            flight_start,
            flight_end,
        } => {
            let contract = app
                .create_contract(ContractForm {
                    name,
                    client_id,
                    flight_start,
                    flight_end,
                })
                .await?;
            tracing::info!("✅ Contract created with ID {}", contract.contract_uid);
            render(&contract)
        }
        Command::EditContract {
            contract_id,
            name,
            client_id,
            flight_start,
            flight_end,
        } => render(
            &app.edit_contract(
                contract_id,
                ContractForm {
                    name,
                    client_id,
                    flight_start,
                    flight_end,
                },
            )
            .await?,
        ),
        Command::DeleteContract { contract_id } => {
            render(&app.delete_contract(contract_id).await?)
        }
        Command::CreateCampaign {
            contract_id,
            name,
            notes,
        } => render(
            &app.create_campaign(contract_id, CampaignForm { name, notes })
                .await?,
        ),
        Command::EditCampaign {
            campaign_id,
            name,
            notes,
        } => render(
            &app.edit_campaign(campaign_id, CampaignForm { name, notes })
                .await?,
        ),
        Command::ProgramChoices { campaign_id } => {
            render(&app.program_form_choices(campaign_id).await?)
        }
        Command::CreateProgram {
            campaign_id,
            name,
            status,
            start_date,
            end_date,
        } => render(
            &app.create_program(
                campaign_id,
                ProgramForm {
                    name,
                    status,
                    start_date,
                    end_date,
                },
            )
            .await?,
        ),
        Command::AttachTargetList {
            program_id,
            target_list_id,
        } => render(
            &app.attach_target_list(program_id, target_list_id.as_deref())
                .await?,
        ),
        Command::MapPlacement {
            program_id,
            placement_id,
        } => render(&app.map_placement(program_id, placement_id.as_deref()).await?),
        Command::ListPlacements => render(&app.list_placements().await),
        Command::CreatePlacement { name, channel } => {
            render(&app.create_placement(PlacementForm { name, channel }).await?)
        }
        Command::ListTargetLists => render(&app.list_target_lists().await),
        Command::UploadChoices => render(&app.upload_form_choices().await),
        Command::UploadTargetList {
            file,
            title,
            use_case,
            client_ids,
            uploaded_by,
        } => {
            let file = match file {
                Some(path) => {
                    Some(UploadedFile::from_path(&path, app.settings().max_upload_bytes).await?)
                }
                None => None,
            };
            let target_list = app
                .upload_target_list(UploadForm {
                    title,
                    use_case,
                    client_ids,
                    file,
                    uploaded_by,
                })
                .await?;
            tracing::info!("📁 Target list stored at {}", target_list.storage_key);
            render(&target_list)
        }
        Command::DownloadUrl {
            target_list_id,
            expires_in,
        } => {
            let url = app
                .target_list_download_url(target_list_id, expires_in)
                .await?;
            Ok(url)
        }
    }
}
