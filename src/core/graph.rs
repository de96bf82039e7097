//! Arena-style entity graph.
//!
//! Every entity lives in its own table keyed by surrogate id. The two
//! many-to-many relations are stored once, as sets of id pairs, and both
//! directions are answered by filtering those sets. Constraint checks mirror a
//! relational store: NOT NULL columns, foreign keys, unique external ids and
//! composite primary keys on the link tables all surface as
//! `IntegrityViolation`.
//!
//! Mutations go through [`GraphStore::transaction`], which runs against a
//! working copy and swaps it in only when the closure (and the optional
//! snapshot write) succeeds. Snapshot I/O runs on the blocking pool.

use crate::domain::model::{
    Campaign, Client, Contract, ContractChanges, NewCampaign, NewClient, NewContract,
    NewPlacement, NewProgram, NewTargetList, Placement, Program, ProgramTargetList, TargetList,
    DEFAULT_PLACEMENT_STATUS,
};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{CampaignError, Result};
use chrono::Utc;
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Sequences {
    clients: i64,
    contracts: i64,
    campaigns: i64,
    programs: i64,
    placements: i64,
    target_lists: i64,
    program_target_lists: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

fn not_null(column: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| CampaignError::integrity(format!("NOT NULL constraint failed: {}", column)))
}

/// Rows removed by a contract delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub contract_id: i64,
    pub campaigns: usize,
    pub programs: usize,
    pub program_target_lists: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    sequences: Sequences,
    #[serde(default)]
    clients: BTreeMap<i64, Client>,
    #[serde(default)]
    contracts: BTreeMap<i64, Contract>,
    #[serde(default)]
    campaigns: BTreeMap<i64, Campaign>,
    #[serde(default)]
    programs: BTreeMap<i64, Program>,
    #[serde(default)]
    placements: BTreeMap<i64, Placement>,
    #[serde(default)]
    target_lists: BTreeMap<i64, TargetList>,
    #[serde(default)]
    program_target_lists: BTreeMap<i64, ProgramTargetList>,
    /// (program_id, placement_id)
    #[serde(default)]
    programs_placements: BTreeSet<(i64, i64)>,
    /// (client_id, target_list_id)
    #[serde(default)]
    client_target_lists: BTreeSet<(i64, i64)>,
}

impl Tables {
    // ---- lookups -------------------------------------------------------

    pub fn client(&self, id: i64) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn contract(&self, id: i64) -> Option<&Contract> {
        self.contracts.get(&id)
    }

    pub fn campaign(&self, id: i64) -> Option<&Campaign> {
        self.campaigns.get(&id)
    }

    pub fn program(&self, id: i64) -> Option<&Program> {
        self.programs.get(&id)
    }

    pub fn placement(&self, id: i64) -> Option<&Placement> {
        self.placements.get(&id)
    }

    pub fn target_list(&self, id: i64) -> Option<&TargetList> {
        self.target_lists.get(&id)
    }

    pub fn require_contract(&self, id: i64) -> Result<&Contract> {
        self.contract(id)
            .ok_or_else(|| CampaignError::not_found("Contract", id))
    }

    pub fn require_campaign(&self, id: i64) -> Result<&Campaign> {
        self.campaign(id)
            .ok_or_else(|| CampaignError::not_found("Campaign", id))
    }

    pub fn require_program(&self, id: i64) -> Result<&Program> {
        self.program(id)
            .ok_or_else(|| CampaignError::not_found("Program", id))
    }

    pub fn require_placement(&self, id: i64) -> Result<&Placement> {
        self.placement(id)
            .ok_or_else(|| CampaignError::not_found("Placement", id))
    }

    pub fn require_target_list(&self, id: i64) -> Result<&TargetList> {
        self.target_list(id)
            .ok_or_else(|| CampaignError::not_found("TargetList", id))
    }

    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    pub fn contracts(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.values()
    }

    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.placements.values()
    }

    pub fn target_lists(&self) -> impl Iterator<Item = &TargetList> {
        self.target_lists.values()
    }

    pub fn program_target_lists(&self) -> impl Iterator<Item = &ProgramTargetList> {
        self.program_target_lists.values()
    }

    pub fn campaigns_of(&self, contract_id: i64) -> impl Iterator<Item = &Campaign> {
        self.campaigns
            .values()
            .filter(move |campaign| campaign.contract_id == contract_id)
    }

    pub fn programs_of(&self, campaign_id: i64) -> impl Iterator<Item = &Program> {
        self.programs
            .values()
            .filter(move |program| program.campaign_id == campaign_id)
    }

    pub fn contract_uid_exists(&self, uid: &str) -> bool {
        self.contracts.values().any(|c| c.contract_uid == uid)
    }

    pub fn list_uid_exists(&self, uid: &str) -> bool {
        self.target_lists.values().any(|t| t.list_uid == uid)
    }

    // ---- relation views ------------------------------------------------

    pub fn has_program_placement(&self, program_id: i64, placement_id: i64) -> bool {
        self.programs_placements
            .contains(&(program_id, placement_id))
    }

    pub fn has_client_target_list(&self, client_id: i64, target_list_id: i64) -> bool {
        self.client_target_lists
            .contains(&(client_id, target_list_id))
    }

    pub fn placements_for_program(&self, program_id: i64) -> Vec<&Placement> {
        self.programs_placements
            .iter()
            .filter(|(program, _)| *program == program_id)
            .filter_map(|(_, placement)| self.placements.get(placement))
            .collect()
    }

    pub fn programs_for_placement(&self, placement_id: i64) -> Vec<&Program> {
        self.programs_placements
            .iter()
            .filter(|(_, placement)| *placement == placement_id)
            .filter_map(|(program, _)| self.programs.get(program))
            .collect()
    }

    pub fn target_lists_for_client(&self, client_id: i64) -> Vec<&TargetList> {
        self.client_target_lists
            .iter()
            .filter(|(client, _)| *client == client_id)
            .filter_map(|(_, list)| self.target_lists.get(list))
            .collect()
    }

    pub fn clients_for_target_list(&self, target_list_id: i64) -> Vec<&Client> {
        self.client_target_lists
            .iter()
            .filter(|(_, list)| *list == target_list_id)
            .filter_map(|(client, _)| self.clients.get(client))
            .collect()
    }

    pub fn attachments_for_program(&self, program_id: i64) -> Vec<&ProgramTargetList> {
        self.program_target_lists
            .values()
            .filter(|row| row.program_id == program_id)
            .collect()
    }

    pub fn attachments_for_target_list(&self, target_list_id: i64) -> Vec<&ProgramTargetList> {
        self.program_target_lists
            .values()
            .filter(|row| row.target_list_id == target_list_id)
            .collect()
    }

    // ---- inserts and updates -------------------------------------------

    pub fn insert_client(&mut self, row: NewClient) -> Result<Client> {
        let pharma = not_null("clients.pharma", row.pharma)?;
        let brand = not_null("clients.brand", row.brand)?;

        let client = Client {
            id: next_id(&mut self.sequences.clients),
            pharma,
            brand,
            agency: row.agency,
            indication: row.indication,
            created_at: Utc::now(),
        };
        self.clients.insert(client.id, client.clone());
        Ok(client)
    }

    pub fn insert_contract(&mut self, row: NewContract) -> Result<Contract> {
        let name = not_null("contracts.name", row.name)?;
        self.check_client_fk("contracts.client_id", row.client_id)?;
        if self.contract_uid_exists(&row.contract_uid) {
            return Err(CampaignError::integrity(format!(
                "UNIQUE constraint failed: contracts.contract_uid ({})",
                row.contract_uid
            )));
        }

        let contract = Contract {
            id: next_id(&mut self.sequences.contracts),
            contract_uid: row.contract_uid,
            name,
            client_id: row.client_id,
            flight_start: row.flight_start,
            flight_end: row.flight_end,
            created_at: Utc::now(),
        };
        self.contracts.insert(contract.id, contract.clone());
        Ok(contract)
    }

    /// Field-level edit. `contract_uid` and `created_at` are left untouched.
    pub fn update_contract(&mut self, id: i64, changes: ContractChanges) -> Result<Contract> {
        self.require_contract(id)?;
        self.check_client_fk("contracts.client_id", changes.client_id)?;

        let contract = self
            .contracts
            .get_mut(&id)
            .ok_or_else(|| CampaignError::not_found("Contract", id))?;
        contract.name = changes.name;
        contract.client_id = changes.client_id;
        contract.flight_start = changes.flight_start;
        contract.flight_end = changes.flight_end;
        Ok(contract.clone())
    }

    pub fn insert_campaign(&mut self, row: NewCampaign) -> Result<Campaign> {
        let name = not_null("campaigns.name", row.name)?;
        if !self.contracts.contains_key(&row.contract_id) {
            return Err(fk_violation("campaigns.contract_id", row.contract_id));
        }

        let campaign = Campaign {
            id: next_id(&mut self.sequences.campaigns),
            contract_id: row.contract_id,
            name,
            notes: row.notes,
        };
        self.campaigns.insert(campaign.id, campaign.clone());
        Ok(campaign)
    }

    pub fn update_campaign(
        &mut self,
        id: i64,
        name: String,
        notes: Option<String>,
    ) -> Result<Campaign> {
        let campaign = self
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| CampaignError::not_found("Campaign", id))?;
        campaign.name = name;
        campaign.notes = notes;
        Ok(campaign.clone())
    }

    pub fn insert_program(&mut self, row: NewProgram) -> Result<Program> {
        let name = not_null("programs.name", row.name)?;
        if !self.campaigns.contains_key(&row.campaign_id) {
            return Err(fk_violation("programs.campaign_id", row.campaign_id));
        }

        let program = Program {
            id: next_id(&mut self.sequences.programs),
            campaign_id: row.campaign_id,
            name,
            status: row.status,
            start_date: row.start_date,
            end_date: row.end_date,
        };
        self.programs.insert(program.id, program.clone());
        Ok(program)
    }

    pub fn insert_placement(&mut self, row: NewPlacement) -> Result<Placement> {
        let name = not_null("placements.name", row.name)?;

        let placement = Placement {
            id: next_id(&mut self.sequences.placements),
            name,
            channel: row.channel,
            status: row
                .status
                .unwrap_or_else(|| DEFAULT_PLACEMENT_STATUS.to_string()),
            start_date: row.start_date,
            end_date: row.end_date,
        };
        self.placements.insert(placement.id, placement.clone());
        Ok(placement)
    }

    pub fn insert_target_list(&mut self, row: NewTargetList) -> Result<TargetList> {
        if self.list_uid_exists(&row.list_uid) {
            return Err(CampaignError::integrity(format!(
                "UNIQUE constraint failed: target_lists.list_uid ({})",
                row.list_uid
            )));
        }

        let target_list = TargetList {
            id: next_id(&mut self.sequences.target_lists),
            list_uid: row.list_uid,
            title: row.title,
            use_case: row.use_case,
            storage_key: row.storage_key,
            file_ext: row.file_ext,
            uploaded_by: row.uploaded_by,
            uploaded_at: Utc::now(),
        };
        self.target_lists
            .insert(target_list.id, target_list.clone());
        Ok(target_list)
    }

    /// No uniqueness on (program, target list): every call adds a row.
    pub fn insert_program_target_list(
        &mut self,
        program_id: i64,
        target_list_id: i64,
    ) -> Result<ProgramTargetList> {
        if !self.programs.contains_key(&program_id) {
            return Err(fk_violation("program_target_lists.program_id", program_id));
        }
        if !self.target_lists.contains_key(&target_list_id) {
            return Err(fk_violation(
                "program_target_lists.target_list_id",
                target_list_id,
            ));
        }

        let row = ProgramTargetList {
            id: next_id(&mut self.sequences.program_target_lists),
            program_id,
            target_list_id,
            assigned_at: Utc::now(),
        };
        self.program_target_lists.insert(row.id, row.clone());
        Ok(row)
    }

    pub fn link_program_placement(&mut self, program_id: i64, placement_id: i64) -> Result<()> {
        if !self.programs.contains_key(&program_id) {
            return Err(fk_violation("programs_placements.program_id", program_id));
        }
        if !self.placements.contains_key(&placement_id) {
            return Err(fk_violation("programs_placements.placement_id", placement_id));
        }
        if !self
            .programs_placements
            .insert((program_id, placement_id))
        {
            return Err(CampaignError::integrity(format!(
                "UNIQUE constraint failed: programs_placements ({}, {})",
                program_id, placement_id
            )));
        }
        Ok(())
    }

    pub fn link_client_target_list(&mut self, client_id: i64, target_list_id: i64) -> Result<()> {
        self.check_client_fk("client_target_lists.client_id", client_id)?;
        if !self.target_lists.contains_key(&target_list_id) {
            return Err(fk_violation(
                "client_target_lists.target_list_id",
                target_list_id,
            ));
        }
        if !self
            .client_target_lists
            .insert((client_id, target_list_id))
        {
            return Err(CampaignError::integrity(format!(
                "UNIQUE constraint failed: client_target_lists ({}, {})",
                client_id, target_list_id
            )));
        }
        Ok(())
    }

    // ---- deletes -------------------------------------------------------

    /// Removes the contract, its campaigns, their programs, those programs'
    /// attachment rows and placement links. Placements, target lists and
    /// clients are shared and never removed here.
    pub fn delete_contract(&mut self, id: i64) -> Result<CascadeReport> {
        self.require_contract(id)?;

        let campaign_ids: BTreeSet<i64> = self.campaigns_of(id).map(|c| c.id).collect();
        let program_ids: BTreeSet<i64> = self
            .programs
            .values()
            .filter(|p| campaign_ids.contains(&p.campaign_id))
            .map(|p| p.id)
            .collect();

        let attachments_before = self.program_target_lists.len();
        self.program_target_lists
            .retain(|_, row| !program_ids.contains(&row.program_id));
        let program_target_lists = attachments_before - self.program_target_lists.len();

        self.programs_placements
            .retain(|(program, _)| !program_ids.contains(program));
        self.programs.retain(|pid, _| !program_ids.contains(pid));
        self.campaigns.retain(|cid, _| !campaign_ids.contains(cid));
        self.contracts.remove(&id);

        Ok(CascadeReport {
            contract_id: id,
            campaigns: campaign_ids.len(),
            programs: program_ids.len(),
            program_target_lists,
        })
    }

    fn check_client_fk(&self, column: &str, client_id: i64) -> Result<()> {
        if self.clients.contains_key(&client_id) {
            Ok(())
        } else {
            Err(fk_violation(column, client_id))
        }
    }
}

fn fk_violation(column: &str, id: i64) -> CampaignError {
    CampaignError::integrity(format!(
        "FOREIGN KEY constraint failed: {} = {}",
        column, id
    ))
}

/// Process-wide handle to the entity graph. Construct once at start-up and
/// share by reference (or `Arc`) with every request.
///
/// A snapshot-backed store may be shared by several processes. Each
/// transaction holds an exclusive lock on `<snapshot>.lock`, reloads the
/// snapshot, applies the change and writes it back before releasing the lock.
#[derive(Debug, Default)]
pub struct GraphStore {
    tables: RwLock<Tables>,
    snapshot_path: Option<PathBuf>,
}

impl GraphStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a snapshot-backed store, starting empty if the file is missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tables = load_snapshot(&path)?;

        Ok(Self {
            tables: RwLock::new(tables),
            snapshot_path: Some(path),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        match config.database_path() {
            Some(path) => Self::open(path),
            None => Ok(Self::in_memory()),
        }
    }

    /// Reads the tables as of the last open or commit through this handle.
    pub async fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        let tables = self.tables.read().await;
        f(&tables)
    }

    /// Runs `f` against a working copy. The copy replaces the live tables only
    /// if `f` returns Ok and the snapshot (when configured) is written.
    pub async fn transaction<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let mut live = self.tables.write().await;

        let Some(path) = self.snapshot_path.clone() else {
            let mut working = live.clone();
            let value = f(&mut working)?;
            *live = working;
            return Ok(value);
        };

        let (lock, latest) = run_blocking({
            let path = path.clone();
            move || lock_and_load(&path)
        })
        .await?;

        let mut working = latest.clone();
        let value = match f(&mut working) {
            Ok(value) => value,
            Err(err) => {
                *live = latest;
                return Err(err);
            }
        };

        let written = run_blocking(move || {
            let result = write_snapshot(&path, &working);
            drop(lock);
            result.map(|_| working)
        })
        .await;

        match written {
            Ok(working) => {
                *live = working;
                Ok(value)
            }
            Err(err) => {
                *live = latest;
                Err(err)
            }
        }
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CampaignError::IoError(std::io::Error::other(e)))?
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<Tables> {
    if !path.exists() {
        tracing::debug!("No graph snapshot at {}, starting empty", path.display());
        return Ok(Tables::default());
    }

    let content = fs::read(path)?;
    let tables: Tables = serde_json::from_slice(&content)?;
    tracing::debug!(
        "Loaded graph snapshot from {} ({} contracts, {} target lists)",
        path.display(),
        tables.contracts.len(),
        tables.target_lists.len()
    );
    Ok(tables)
}

/// Blocks until the snapshot lock is held, then loads the latest snapshot.
/// The lock is released when the returned file is dropped.
fn lock_and_load(path: &Path) -> Result<(File, Tables)> {
    ensure_parent(path)?;
    let lock = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path(path))?;
    lock.lock_exclusive()?;

    let tables = load_snapshot(path)?;
    Ok((lock, tables))
}

fn write_snapshot(path: &Path, tables: &Tables) -> Result<()> {
    ensure_parent(path)?;

    let data = serde_json::to_vec_pretty(tables)?;
    let tmp_path = path.with_extension(format!("tmp-{}", Uuid::new_v4()));
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    tracing::debug!("Wrote graph snapshot ({} bytes) to {}", data.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::UseCase;
    use std::sync::Arc;

    fn client(tables: &mut Tables, pharma: &str) -> Client {
        tables
            .insert_client(NewClient {
                pharma: Some(pharma.to_string()),
                brand: Some("Brand".to_string()),
                ..Default::default()
            })
            .unwrap()
    }

    fn contract(tables: &mut Tables, client_id: i64, uid: &str) -> Contract {
        tables
            .insert_contract(NewContract {
                contract_uid: uid.to_string(),
                name: Some(format!("Contract {}", uid)),
                client_id,
                flight_start: None,
                flight_end: None,
            })
            .unwrap()
    }

    fn campaign(tables: &mut Tables, contract_id: i64) -> Campaign {
        tables
            .insert_campaign(NewCampaign {
                contract_id,
                name: Some("Spring".to_string()),
                notes: None,
            })
            .unwrap()
    }

    fn program(tables: &mut Tables, campaign_id: i64) -> Program {
        tables
            .insert_program(NewProgram {
                campaign_id,
                name: Some("Program".to_string()),
                status: "DRAFT".to_string(),
                start_date: None,
                end_date: None,
            })
            .unwrap()
    }

    fn target_list(tables: &mut Tables, uid: &str) -> TargetList {
        tables
            .insert_target_list(NewTargetList {
                list_uid: uid.to_string(),
                title: "List".to_string(),
                use_case: UseCase::Rfp,
                storage_key: format!("target-lists/{}.csv", uid),
                file_ext: Some("csv".to_string()),
                uploaded_by: Some("system".to_string()),
            })
            .unwrap()
    }

    fn placement(tables: &mut Tables, name: &str) -> Placement {
        tables
            .insert_placement(NewPlacement {
                name: Some(name.to_string()),
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn test_contract_requires_existing_client() {
        let mut tables = Tables::default();
        let err = tables
            .insert_contract(NewContract {
                contract_uid: "abc".to_string(),
                name: Some("Orphan".to_string()),
                client_id: 99,
                flight_start: None,
                flight_end: None,
            })
            .unwrap_err();
        assert!(matches!(err, CampaignError::IntegrityViolation { .. }));
        assert_eq!(tables.contracts().count(), 0);
    }

    #[test]
    fn test_contract_uid_is_unique() {
        let mut tables = Tables::default();
        let c = client(&mut tables, "Acme");
        contract(&mut tables, c.id, "dup");
        let err = tables
            .insert_contract(NewContract {
                contract_uid: "dup".to_string(),
                name: Some("Second".to_string()),
                client_id: c.id,
                flight_start: None,
                flight_end: None,
            })
            .unwrap_err();
        assert!(matches!(err, CampaignError::IntegrityViolation { .. }));
    }

    #[test]
    fn test_missing_required_column_is_integrity_violation() {
        let mut tables = Tables::default();
        let err = tables.insert_client(NewClient::default()).unwrap_err();
        assert!(err.to_string().contains("clients.pharma"));
    }

    #[test]
    fn test_placement_defaults_to_planned() {
        let mut tables = Tables::default();
        assert_eq!(placement(&mut tables, "Email blast").status, "PLANNED");
    }

    #[test]
    fn test_relation_views_are_symmetric() {
        let mut tables = Tables::default();
        let c = client(&mut tables, "Acme");
        let k = contract(&mut tables, c.id, "k1");
        let camp = campaign(&mut tables, k.id);
        let prog = program(&mut tables, camp.id);
        let pl = placement(&mut tables, "Banner");
        let tl = target_list(&mut tables, "t1");

        tables.link_program_placement(prog.id, pl.id).unwrap();
        tables.link_client_target_list(c.id, tl.id).unwrap();

        assert_eq!(tables.placements_for_program(prog.id)[0].id, pl.id);
        assert_eq!(tables.programs_for_placement(pl.id)[0].id, prog.id);
        assert_eq!(tables.target_lists_for_client(c.id)[0].id, tl.id);
        assert_eq!(tables.clients_for_target_list(tl.id)[0].id, c.id);
    }

    #[test]
    fn test_link_tables_reject_duplicate_pairs() {
        let mut tables = Tables::default();
        let c = client(&mut tables, "Acme");
        let tl = target_list(&mut tables, "t1");
        tables.link_client_target_list(c.id, tl.id).unwrap();
        assert!(tables.link_client_target_list(c.id, tl.id).is_err());
        assert_eq!(tables.clients_for_target_list(tl.id).len(), 1);
    }

    #[test]
    fn test_delete_contract_cascades_and_spares_shared_rows() {
        let mut tables = Tables::default();
        let c = client(&mut tables, "Acme");
        let doomed = contract(&mut tables, c.id, "k1");
        let kept = contract(&mut tables, c.id, "k2");
        let camp = campaign(&mut tables, doomed.id);
        let kept_camp = campaign(&mut tables, kept.id);
        let prog = program(&mut tables, camp.id);
        let kept_prog = program(&mut tables, kept_camp.id);
        let pl = placement(&mut tables, "Banner");
        let tl = target_list(&mut tables, "t1");
        tables.link_program_placement(prog.id, pl.id).unwrap();
        tables.link_program_placement(kept_prog.id, pl.id).unwrap();
        tables.insert_program_target_list(prog.id, tl.id).unwrap();
        tables.insert_program_target_list(prog.id, tl.id).unwrap();
        tables.insert_program_target_list(kept_prog.id, tl.id).unwrap();

        let report = tables.delete_contract(doomed.id).unwrap();

        assert_eq!(
            report,
            CascadeReport {
                contract_id: doomed.id,
                campaigns: 1,
                programs: 1,
                program_target_lists: 2,
            }
        );
        assert!(tables.contract(doomed.id).is_none());
        assert!(tables.campaign(camp.id).is_none());
        assert!(tables.program(prog.id).is_none());
        assert!(tables.contract(kept.id).is_some());
        assert!(tables.program(kept_prog.id).is_some());
        assert!(tables.placement(pl.id).is_some());
        assert!(tables.target_list(tl.id).is_some());
        assert_eq!(tables.programs_for_placement(pl.id).len(), 1);
        assert_eq!(tables.attachments_for_target_list(tl.id).len(), 1);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut tables = Tables::default();
        let c = client(&mut tables, "Acme");
        let first = contract(&mut tables, c.id, "k1");
        tables.delete_contract(first.id).unwrap();
        let second = contract(&mut tables, c.id, "k2");
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_failed_transaction_leaves_graph_unchanged() {
        let store = GraphStore::in_memory();
        let result: Result<()> = store
            .transaction(|tx| {
                tx.insert_client(NewClient {
                    pharma: Some("Acme".to_string()),
                    brand: Some("X".to_string()),
                    ..Default::default()
                })?;
                Err(CampaignError::integrity("forced"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(store.read(|t| t.clients().count()).await, 0);
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");

        let store = GraphStore::open(&path).unwrap();
        store
            .transaction(|tx| {
                let c = client(tx, "Acme");
                contract(tx, c.id, "persisted");
                Ok(())
            })
            .await
            .unwrap();
        drop(store);

        let reopened = GraphStore::open(&path).unwrap();
        assert!(reopened.read(|t| t.contract_uid_exists("persisted")).await);
        let next = reopened
            .transaction(|tx| Ok(client(tx, "Beta").id))
            .await
            .unwrap();
        assert_eq!(next, 2);
    }

    #[tokio::test]
    async fn test_two_handles_on_one_snapshot_keep_both_commits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let a = GraphStore::open(&path).unwrap();
        let b = GraphStore::open(&path).unwrap();

        let id_a = a.transaction(|tx| Ok(client(tx, "A").id)).await.unwrap();
        let id_b = b.transaction(|tx| Ok(client(tx, "B").id)).await.unwrap();
        assert_ne!(id_a, id_b);

        let reopened = GraphStore::open(&path).unwrap();
        let pharmas: Vec<String> = reopened
            .read(|t| t.clients().map(|c| c.pharma.clone()).collect())
            .await;
        assert_eq!(pharmas, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(b.read(|t| t.clients().count()).await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_commits_through_separate_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let a = Arc::new(GraphStore::open(&path).unwrap());
        let b = Arc::new(GraphStore::open(&path).unwrap());

        let mut tasks = Vec::new();
        for i in 0..10 {
            let store = if i % 2 == 0 { a.clone() } else { b.clone() };
            tasks.push(tokio::spawn(async move {
                store
                    .transaction(move |tx| Ok(client(tx, &format!("Pharma {}", i)).id))
                    .await
                    .unwrap()
            }));
        }
        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }
        ids.sort();
        assert_eq!(ids, (1..=10).collect::<Vec<i64>>());

        let reopened = GraphStore::open(&path).unwrap();
        assert_eq!(reopened.read(|t| t.clients().count()).await, 10);
    }

    #[tokio::test]
    async fn test_snapshot_write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let store = GraphStore::open(&path).unwrap();
        for name in ["Acme", "Beta"] {
            store
                .transaction(|tx| Ok(client(tx, name).id))
                .await
                .unwrap();
        }

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["graph.json", "graph.json.lock"]);
    }
}
