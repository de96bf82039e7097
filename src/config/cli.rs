use crate::config::toml_config::AppConfig;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "campaign-graph")]
#[command(about = "Manage clients, contracts, campaigns, programs, placements and target lists")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the graph snapshot path from config
    #[arg(long)]
    pub database: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(database) = &self.database {
            tracing::info!("🔧 Database path overridden to: {}", database);
            config.database.path = Some(database.clone());
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    ListClients,
    CreateClient {
        #[arg(long)]
        pharma: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        agency: Option<String>,
        #[arg(long)]
        indication: Option<String>,
    },
    ListContracts,
    /// Clients to choose from when creating a contract
    ContractChoices,
    ShowContract {
        contract_id: i64,
    },
    CreateContract {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        client_id: Option<String>,
        #[arg(long)]
        flight_start: Option<String>,
        #[arg(long)]
        flight_end: Option<String>,
    },
    EditContract {
        contract_id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        client_id: Option<String>,
        #[arg(long)]
        flight_start: Option<String>,
        #[arg(long)]
        flight_end: Option<String>,
    },
    DeleteContract {
        contract_id: i64,
    },
    CreateCampaign {
        contract_id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    EditCampaign {
        campaign_id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Target lists and placements available to a campaign's programs
    ProgramChoices {
        campaign_id: i64,
    },
    CreateProgram {
        campaign_id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
    },
    AttachTargetList {
        program_id: i64,
        #[arg(long)]
        target_list_id: Option<String>,
    },
    MapPlacement {
        program_id: i64,
        #[arg(long)]
        placement_id: Option<String>,
    },
    ListPlacements,
    CreatePlacement {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        channel: Option<String>,
    },
    ListTargetLists,
    /// Clients and use cases to choose from when uploading
    UploadChoices,
    UploadTargetList {
        /// File to upload
        #[arg(long)]
        file: Option<String>,
        #[arg(long)]
        title: Option<String>,
        /// RFP, PROGRAM_MAPPING or INTERNAL
        #[arg(long)]
        use_case: Option<String>,
        /// Repeat to link several clients
        #[arg(long = "client-id")]
        client_ids: Vec<String>,
        #[arg(long)]
        uploaded_by: Option<String>,
    },
    DownloadUrl {
        target_list_id: i64,
        /// Seconds the URL stays valid (defaults to config)
        #[arg(long)]
        expires_in: Option<u64>,
    },
}
