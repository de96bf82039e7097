//! Mutation procedures over the entity graph.
//!
//! Each operation validates its input first, touches the artifact store only
//! for uploads, then applies one all-or-nothing transaction. None of them is
//! retried internally: re-submitting `create_program` or `attach_target_list`
//! creates another row.

use crate::core::graph::{CascadeReport, GraphStore};
use crate::core::uid::RandomUid;
use crate::domain::forms::{CampaignForm, ClientForm, ContractForm, PlacementForm, ProgramForm, UploadForm};
use crate::domain::model::{
    Campaign, Client, Contract, ContractChanges, NewCampaign, NewClient, NewContract,
    NewPlacement, NewProgram, NewTargetList, Placement, Program, ProgramTargetList, TargetList,
    UseCase, DEFAULT_PROGRAM_STATUS,
};
use crate::domain::ports::{ArtifactStore, ConfigProvider, UidSource};
use crate::utils::error::{CampaignError, Result};
use crate::utils::validation::{parse_id, parse_optional_date, trimmed_non_empty};
use serde::Serialize;
use std::sync::Arc;

const UID_ATTEMPTS: usize = 8;

#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub max_upload_bytes: u64,
    pub default_uploaded_by: String,
    pub presign_expiry_seconds: u64,
}

impl WorkflowSettings {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes(),
            default_uploaded_by: config.default_uploaded_by().to_string(),
            presign_expiry_seconds: config.presign_expiry_seconds(),
        }
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: 100 * 1024 * 1024,
            default_uploaded_by: "system".to_string(),
            presign_expiry_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlacementMapping {
    pub program_id: i64,
    pub placement_id: i64,
    /// False when the pair was already linked and nothing changed.
    pub newly_mapped: bool,
}

pub struct Workflows<A: ArtifactStore, U: UidSource = RandomUid> {
    pub(crate) store: Arc<GraphStore>,
    pub(crate) artifacts: A,
    pub(crate) uids: U,
    pub(crate) settings: WorkflowSettings,
}

impl<A: ArtifactStore> Workflows<A, RandomUid> {
    pub fn new(store: Arc<GraphStore>, artifacts: A, settings: WorkflowSettings) -> Self {
        Self::with_uid_source(store, artifacts, RandomUid, settings)
    }
}

impl<A: ArtifactStore, U: UidSource> Workflows<A, U> {
    pub fn with_uid_source(
        store: Arc<GraphStore>,
        artifacts: A,
        uids: U,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            store,
            artifacts,
            uids,
            settings,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub async fn create_client(&self, form: ClientForm) -> Result<Client> {
        let row = NewClient {
            pharma: form.pharma,
            brand: form.brand,
            agency: trimmed_non_empty(form.agency.as_deref()),
            indication: trimmed_non_empty(form.indication.as_deref()),
        };
        let client = self.store.transaction(|tx| tx.insert_client(row)).await?;

        tracing::info!(client_id = client.id, pharma = %client.pharma, "Client created");
        Ok(client)
    }

    /// The client id is not looked up beforehand; an unknown id fails as a
    /// foreign-key violation inside the transaction.
    pub async fn create_contract(&self, form: ContractForm) -> Result<Contract> {
        let client_id = parse_id("client_id", form.client_id.as_deref())?;
        let flight_start = parse_optional_date("flight_start", form.flight_start.as_deref())?;
        let flight_end = parse_optional_date("flight_end", form.flight_end.as_deref())?;

        let contract = self
            .store
            .transaction(|tx| {
                let contract_uid =
                    fresh_uid(&self.uids, |uid| tx.contract_uid_exists(uid), "contract_uid")?;
                tx.insert_contract(NewContract {
                    contract_uid,
                    name: form.name,
                    client_id,
                    flight_start,
                    flight_end,
                })
            })
            .await?;

        tracing::info!(
            contract_id = contract.id,
            contract_uid = %contract.contract_uid,
            client_id,
            "Contract created"
        );
        Ok(contract)
    }

    pub async fn edit_contract(&self, contract_id: i64, form: ContractForm) -> Result<Contract> {
        self.store
            .read(|t| t.require_contract(contract_id).map(|_| ()))
            .await?;

        let name = trimmed_non_empty(form.name.as_deref());
        let client_raw = trimmed_non_empty(form.client_id.as_deref());
        let (Some(name), Some(client_raw)) = (name, client_raw) else {
            return Err(CampaignError::validation("Name and Client are required"));
        };
        let changes = ContractChanges {
            name,
            client_id: parse_id("client_id", Some(client_raw.as_str()))?,
            flight_start: parse_optional_date("flight_start", form.flight_start.as_deref())?,
            flight_end: parse_optional_date("flight_end", form.flight_end.as_deref())?,
        };

        let contract = self
            .store
            .transaction(|tx| tx.update_contract(contract_id, changes))
            .await?;

        tracing::info!(contract_id, contract_uid = %contract.contract_uid, "Contract updated");
        Ok(contract)
    }

    pub async fn create_campaign(&self, contract_id: i64, form: CampaignForm) -> Result<Campaign> {
        let campaign = self
            .store
            .transaction(|tx| {
                tx.require_contract(contract_id)?;
                tx.insert_campaign(NewCampaign {
                    contract_id,
                    name: form.name,
                    notes: trimmed_non_empty(form.notes.as_deref()),
                })
            })
            .await?;

        tracing::info!(campaign_id = campaign.id, contract_id, "Campaign created");
        Ok(campaign)
    }

    pub async fn edit_campaign(&self, campaign_id: i64, form: CampaignForm) -> Result<Campaign> {
        self.store
            .read(|t| t.require_campaign(campaign_id).map(|_| ()))
            .await?;

        let name = trimmed_non_empty(form.name.as_deref())
            .ok_or_else(|| CampaignError::validation("Campaign name is required"))?;
        let notes = trimmed_non_empty(form.notes.as_deref());

        let campaign = self
            .store
            .transaction(|tx| tx.update_campaign(campaign_id, name, notes))
            .await?;

        tracing::info!(campaign_id, "Campaign updated");
        Ok(campaign)
    }

    /// `status` is stored as given; an absent or empty value becomes "DRAFT".
    pub async fn create_program(&self, campaign_id: i64, form: ProgramForm) -> Result<Program> {
        let start_date = parse_optional_date("start_date", form.start_date.as_deref())?;
        let end_date = parse_optional_date("end_date", form.end_date.as_deref())?;
        let status = form
            .status
            .filter(|status| !status.is_empty())
            .unwrap_or_else(|| DEFAULT_PROGRAM_STATUS.to_string());

        let program = self
            .store
            .transaction(|tx| {
                tx.require_campaign(campaign_id)?;
                tx.insert_program(NewProgram {
                    campaign_id,
                    name: form.name,
                    status,
                    start_date,
                    end_date,
                })
            })
            .await?;

        tracing::info!(
            program_id = program.id,
            campaign_id,
            status = %program.status,
            "Program created"
        );
        Ok(program)
    }

    /// Adds an attachment row on every call, including repeats of the same pair.
    pub async fn attach_target_list(
        &self,
        program_id: i64,
        target_list_id: Option<&str>,
    ) -> Result<ProgramTargetList> {
        self.store
            .read(|t| t.require_program(program_id).map(|_| ()))
            .await?;
        let target_list_id = parse_id("target_list_id", target_list_id)?;

        let attachment = self
            .store
            .transaction(|tx| {
                tx.require_program(program_id)?;
                tx.insert_program_target_list(program_id, target_list_id)
            })
            .await?;

        tracing::info!(
            attachment_id = attachment.id,
            program_id,
            target_list_id,
            "Target list attached"
        );
        Ok(attachment)
    }

    /// Mapping an already-linked pair is a no-op.
    pub async fn map_placement(
        &self,
        program_id: i64,
        placement_id: Option<&str>,
    ) -> Result<PlacementMapping> {
        self.store
            .read(|t| t.require_program(program_id).map(|_| ()))
            .await?;
        let placement_id = parse_id("placement_id", placement_id)?;

        let newly_mapped = self
            .store
            .transaction(|tx| {
                tx.require_program(program_id)?;
                tx.require_placement(placement_id)?;
                if tx.has_program_placement(program_id, placement_id) {
                    return Ok(false);
                }
                tx.link_program_placement(program_id, placement_id)?;
                Ok(true)
            })
            .await?;

        if newly_mapped {
            tracing::info!(program_id, placement_id, "Placement mapped to program");
        } else {
            tracing::debug!(program_id, placement_id, "Placement already mapped");
        }
        Ok(PlacementMapping {
            program_id,
            placement_id,
            newly_mapped,
        })
    }

    pub async fn create_placement(&self, form: PlacementForm) -> Result<Placement> {
        let row = NewPlacement {
            name: form.name,
            channel: trimmed_non_empty(form.channel.as_deref()),
            ..Default::default()
        };
        let placement = self.store.transaction(|tx| tx.insert_placement(row)).await?;

        tracing::info!(placement_id = placement.id, "Placement created");
        Ok(placement)
    }

    /// Validates everything before the artifact write, then stores the file,
    /// then commits the TargetList row and its client links together. Client
    /// ids that do not resolve are skipped; already-linked clients are not
    /// linked twice.
    pub async fn upload_target_list(&self, form: UploadForm) -> Result<TargetList> {
        let file = form
            .file
            .ok_or_else(|| CampaignError::validation("No file selected"))?;
        let use_case: UseCase = form.use_case.as_deref().unwrap_or_default().trim().parse()?;
        let title = trimmed_non_empty(form.title.as_deref())
            .ok_or_else(|| CampaignError::validation("Title is required"))?;
        if file.content.len() as u64 > self.settings.max_upload_bytes {
            return Err(CampaignError::validation(format!(
                "File exceeds the maximum upload size of {} bytes",
                self.settings.max_upload_bytes
            )));
        }
        let client_ids = form
            .client_ids
            .iter()
            .map(|raw| parse_id("client_ids", Some(raw.as_str())))
            .collect::<Result<Vec<i64>>>()?;
        let uploaded_by = trimmed_non_empty(form.uploaded_by.as_deref())
            .unwrap_or_else(|| self.settings.default_uploaded_by.clone());
        let file_ext = file.file_ext();

        tracing::debug!(
            "Uploading '{}' ({} bytes) for use case {}",
            file.filename,
            file.content.len(),
            use_case
        );
        let storage_key = self.artifacts.put(file.content, &file.filename).await?;

        let committed = self
            .store
            .transaction(|tx| {
                let list_uid = fresh_uid(&self.uids, |uid| tx.list_uid_exists(uid), "list_uid")?;
                let target_list = tx.insert_target_list(NewTargetList {
                    list_uid,
                    title,
                    use_case,
                    storage_key: storage_key.clone(),
                    file_ext,
                    uploaded_by: Some(uploaded_by),
                })?;

                for &client_id in &client_ids {
                    if tx.client(client_id).is_none() {
                        tracing::debug!(client_id, "Skipping unknown client on upload");
                        continue;
                    }
                    if !tx.has_client_target_list(client_id, target_list.id) {
                        tx.link_client_target_list(client_id, target_list.id)?;
                    }
                }
                Ok(target_list)
            })
            .await;

        match committed {
            Ok(target_list) => {
                tracing::info!(
                    target_list_id = target_list.id,
                    list_uid = %target_list.list_uid,
                    storage_key = %target_list.storage_key,
                    "Target list uploaded"
                );
                Ok(target_list)
            }
            Err(err) => {
                tracing::warn!(
                    storage_key = %storage_key,
                    "Target list metadata was not committed; stored artifact is orphaned: {}",
                    err
                );
                Err(err)
            }
        }
    }

    pub async fn delete_contract(&self, contract_id: i64) -> Result<CascadeReport> {
        let report = self
            .store
            .transaction(|tx| tx.delete_contract(contract_id))
            .await?;

        tracing::info!(
            contract_id,
            campaigns = report.campaigns,
            programs = report.programs,
            program_target_lists = report.program_target_lists,
            "Contract deleted"
        );
        Ok(report)
    }

    /// Presigns the stored file of a target list. Falls back to the configured
    /// expiry when none is given.
    pub async fn target_list_download_url(
        &self,
        target_list_id: i64,
        expiry_seconds: Option<u64>,
    ) -> Result<String> {
        let storage_key = self
            .store
            .read(|t| {
                t.require_target_list(target_list_id)
                    .map(|list| list.storage_key.clone())
            })
            .await?;
        let expiry = expiry_seconds.unwrap_or(self.settings.presign_expiry_seconds);
        self.artifacts.presign(&storage_key, expiry).await
    }
}

fn fresh_uid<U: UidSource>(uids: &U, taken: impl Fn(&str) -> bool, column: &str) -> Result<String> {
    for _ in 0..UID_ATTEMPTS {
        let uid = uids.next_uid();
        if !taken(&uid) {
            return Ok(uid);
        }
        tracing::warn!("Generated {} {} already exists, retrying", column, uid);
    }
    Err(CampaignError::integrity(format!(
        "could not generate an unused {} after {} attempts",
        column, UID_ATTEMPTS
    )))
}
