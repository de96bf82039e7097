use crate::core::graph::Tables;
use crate::core::workflow::Workflows;
use crate::domain::model::{
    Campaign, Client, Contract, Placement, Program, ProgramTargetList, TargetList, UseCase,
};
use crate::domain::ports::{ArtifactStore, UidSource};
use crate::utils::error::Result;
use serde::Serialize;
use std::cmp::Reverse;

#[derive(Debug, Clone, Serialize)]
pub struct ContractSummary {
    pub contract: Contract,
    pub client: Option<Client>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractDetail {
    pub contract: Contract,
    pub client: Option<Client>,
    pub campaigns: Vec<CampaignDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignDetail {
    pub campaign: Campaign,
    pub programs: Vec<ProgramDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramDetail {
    pub program: Program,
    pub placements: Vec<Placement>,
    pub target_lists: Vec<AttachedTargetList>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachedTargetList {
    pub attachment: ProgramTargetList,
    pub target_list: TargetList,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetListSummary {
    pub target_list: TargetList,
    pub clients: Vec<Client>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractEditForm {
    pub contract: Contract,
    pub clients: Vec<Client>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramFormChoices {
    pub campaign: Campaign,
    /// Target lists linked to the client that owns the campaign's contract.
    pub target_lists: Vec<TargetList>,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadFormChoices {
    pub clients: Vec<Client>,
    pub use_cases: Vec<UseCase>,
}

fn clients_by_pharma(tables: &Tables) -> Vec<Client> {
    let mut clients: Vec<Client> = tables.clients().cloned().collect();
    clients.sort_by(|a, b| a.pharma.cmp(&b.pharma).then(a.id.cmp(&b.id)));
    clients
}

fn placements_by_name(tables: &Tables) -> Vec<Placement> {
    let mut placements: Vec<Placement> = tables.placements().cloned().collect();
    placements.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    placements
}

fn program_detail(tables: &Tables, program: &Program) -> ProgramDetail {
    let target_lists = tables
        .attachments_for_program(program.id)
        .into_iter()
        .filter_map(|attachment| {
            tables
                .target_list(attachment.target_list_id)
                .map(|target_list| AttachedTargetList {
                    attachment: attachment.clone(),
                    target_list: target_list.clone(),
                })
        })
        .collect();

    ProgramDetail {
        program: program.clone(),
        placements: tables
            .placements_for_program(program.id)
            .into_iter()
            .cloned()
            .collect(),
        target_lists,
    }
}

impl<A: ArtifactStore, U: UidSource> Workflows<A, U> {
    /// Newest first.
    pub async fn list_clients(&self) -> Vec<Client> {
        self.store
            .read(|t| {
                let mut clients: Vec<Client> = t.clients().cloned().collect();
                clients.sort_by_key(|c| Reverse((c.created_at, c.id)));
                clients
            })
            .await
    }

    /// Newest first.
    pub async fn list_contracts(&self) -> Vec<ContractSummary> {
        self.store
            .read(|t| {
                let mut contracts: Vec<&Contract> = t.contracts().collect();
                contracts.sort_by_key(|c| Reverse((c.created_at, c.id)));
                contracts
                    .into_iter()
                    .map(|contract| ContractSummary {
                        contract: contract.clone(),
                        client: t.client(contract.client_id).cloned(),
                    })
                    .collect()
            })
            .await
    }

    /// Most recent upload first.
    pub async fn list_target_lists(&self) -> Vec<TargetListSummary> {
        self.store
            .read(|t| {
                let mut lists: Vec<&TargetList> = t.target_lists().collect();
                lists.sort_by_key(|l| Reverse((l.uploaded_at, l.id)));
                lists
                    .into_iter()
                    .map(|list| TargetListSummary {
                        target_list: list.clone(),
                        clients: t
                            .clients_for_target_list(list.id)
                            .into_iter()
                            .cloned()
                            .collect(),
                    })
                    .collect()
            })
            .await
    }

    pub async fn list_placements(&self) -> Vec<Placement> {
        self.store.read(placements_by_name).await
    }

    pub async fn contract_detail(&self, contract_id: i64) -> Result<ContractDetail> {
        self.store
            .read(|t| {
                let contract = t.require_contract(contract_id)?;
                let campaigns = t
                    .campaigns_of(contract_id)
                    .map(|campaign| CampaignDetail {
                        campaign: campaign.clone(),
                        programs: t
                            .programs_of(campaign.id)
                            .map(|program| program_detail(t, program))
                            .collect(),
                    })
                    .collect();

                Ok(ContractDetail {
                    contract: contract.clone(),
                    client: t.client(contract.client_id).cloned(),
                    campaigns,
                })
            })
            .await
    }

    pub async fn contract_form_choices(&self) -> Vec<Client> {
        self.store.read(clients_by_pharma).await
    }

    pub async fn contract_edit_form(&self, contract_id: i64) -> Result<ContractEditForm> {
        self.store
            .read(|t| {
                Ok(ContractEditForm {
                    contract: t.require_contract(contract_id)?.clone(),
                    clients: clients_by_pharma(t),
                })
            })
            .await
    }

    pub async fn campaign_edit_form(&self, campaign_id: i64) -> Result<Campaign> {
        self.store
            .read(|t| t.require_campaign(campaign_id).cloned())
            .await
    }

    pub async fn program_form_choices(&self, campaign_id: i64) -> Result<ProgramFormChoices> {
        self.store
            .read(|t| {
                let campaign = t.require_campaign(campaign_id)?;
                let target_lists = t
                    .contract(campaign.contract_id)
                    .map(|contract| {
                        t.target_lists_for_client(contract.client_id)
                            .into_iter()
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();

                Ok(ProgramFormChoices {
                    campaign: campaign.clone(),
                    target_lists,
                    placements: placements_by_name(t),
                })
            })
            .await
    }

    pub async fn upload_form_choices(&self) -> UploadFormChoices {
        UploadFormChoices {
            clients: self.store.read(clients_by_pharma).await,
            use_cases: UseCase::ALL.to_vec(),
        }
    }
}
