//! Transactional store for projects and their installments.
//!
//! The table of rows sits behind an [`RwLock`]; each row has its own [`Mutex`].
//! Payments take the shared table lock plus the row lock, so payments against
//! different installments run side by side while payments against the same one
//! queue up. Anything touching more than one row (project creation, revision,
//! deletion, bulk overrides) takes the exclusive table lock, so readers never see
//! half of it.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::allocation::{ApartmentAllocation, ApartmentPermillage, ProjectTerms, allocate_with};
use crate::calendar::MonthRange;
use crate::config::EngineConfig;
use crate::error::{PaymentsError, Result};
use crate::model::{ApartmentShare, Installment, Project, ProjectStatus};
use crate::money::Cents;
use crate::status::InstallmentStatus;
use crate::summary::{PaymentStatusSummary, SummaryScope, summarize};

#[derive(Debug, Default)]
struct LedgerState {
    projects: HashMap<Uuid, Project>,
    rows: HashMap<Uuid, Mutex<Installment>>,
    project_rows: HashMap<Uuid, Vec<Uuid>>,
}

impl LedgerState {
    fn project(&self, project_id: Uuid) -> Result<&Project> {
        self.projects
            .get(&project_id)
            .ok_or(PaymentsError::ProjectNotFound(project_id))
    }

    fn active_project(&self, project_id: Uuid) -> Result<&Project> {
        let project = self.project(project_id)?;
        if !project.is_active() {
            return Err(PaymentsError::ProjectInactive(project_id));
        }
        Ok(project)
    }

    fn row_ids(&self, project_id: Uuid) -> &[Uuid] {
        self.project_rows
            .get(&project_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn row(&self, installment_id: Uuid) -> Result<&Mutex<Installment>> {
        self.rows
            .get(&installment_id)
            .ok_or(PaymentsError::InstallmentNotFound(installment_id))
    }

    fn insert_rows(&mut self, project_id: Uuid, allocations: &[ApartmentAllocation]) {
        let mut ids = Vec::new();
        for allocation in allocations {
            for scheduled in &allocation.installments {
                let row =
                    Installment::from_schedule(project_id, allocation.apartment_id, scheduled);
                ids.push(row.id);
                self.rows.insert(row.id, Mutex::new(row));
            }
        }
        self.project_rows.insert(project_id, ids);
    }

    fn remove_rows(&mut self, project_id: Uuid) -> usize {
        let ids = self.project_rows.remove(&project_id).unwrap_or_default();
        for id in &ids {
            self.rows.remove(id);
        }
        ids.len()
    }

    fn has_payments(&self, project_id: Uuid) -> Result<bool> {
        for id in self.row_ids(project_id) {
            if self.row(*id)?.lock()?.amount_paid_cents > 0 {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn snapshot(&self, project_id: Uuid) -> Result<Vec<Installment>> {
        self.row_ids(project_id)
            .iter()
            .map(|id| -> Result<Installment> { Ok(self.row(*id)?.lock()?.clone()) })
            .collect()
    }
}

/// In-memory ledger of extraordinary-payments projects.
#[derive(Debug, Default)]
pub struct Ledger {
    config: EngineConfig,
    state: RwLock<LedgerState>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            state: RwLock::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Allocates the budget over the roster snapshot and stores the project with
    /// all of its installments in one step.
    pub fn create_project(
        &self,
        building_id: Uuid,
        name: impl Into<String>,
        terms: ProjectTerms,
        roster: Vec<ApartmentPermillage>,
    ) -> Result<Project> {
        let allocations = allocate_with(&terms, &roster, &self.config)?;
        let project_id = Uuid::new_v4();
        let project = Project {
            id: project_id,
            building_id,
            name: name.into(),
            shares: ApartmentShare::from_allocations(project_id, &allocations),
            terms,
            roster,
            status: ProjectStatus::Active,
            created_at: Utc::now(),
        };

        let mut state = self.state.write()?;
        state.insert_rows(project_id, &allocations);
        state.projects.insert(project_id, project.clone());

        info!(
            project_id = %project.id,
            building_id = %project.building_id,
            budget_cents = project.terms.budget_cents,
            installments = project.terms.installment_count,
            apartments = project.roster.len(),
            "created extraordinary-payments project"
        );
        Ok(project)
    }

    /// Adds `amount_cents` to what has been paid on an installment.
    ///
    /// Several payments may be recorded against one installment; they add up.
    /// Paying more than is due marks it paid and the excess is not carried over.
    pub fn record_payment(
        &self,
        installment_id: Uuid,
        amount_cents: Cents,
        at: DateTime<Utc>,
    ) -> Result<Installment> {
        if amount_cents < 0 {
            return Err(PaymentsError::InvalidAmount(amount_cents));
        }

        let state = self.state.read()?;
        let mut row = state.row(installment_id)?.lock()?;
        state.active_project(row.project_id)?;
        row.apply_payment(amount_cents, at)?;

        info!(
            installment_id = %installment_id,
            amount_cents,
            paid_cents = row.amount_paid_cents,
            status = %row.status,
            "recorded payment"
        );
        Ok(row.clone())
    }

    /// Manager correction: marks every installment of the apartment in `range`
    /// as fully paid (`Paid`) or not paid at all (`Pending`).
    ///
    /// Returns how many installments were changed.
    pub fn bulk_set_status(
        &self,
        apartment_id: Uuid,
        project_id: Uuid,
        range: MonthRange,
        target: InstallmentStatus,
        at: DateTime<Utc>,
    ) -> Result<usize> {
        let settled = match target {
            InstallmentStatus::Paid => true,
            InstallmentStatus::Pending => false,
            other => {
                warn!(%apartment_id, %project_id, status = %other, "rejected status override");
                return Err(PaymentsError::InvalidStatusOverride(format!(
                    "installments can only be forced to paid or pending, not {other}"
                )));
            }
        };

        let mut state = self.state.write()?;
        state.active_project(project_id)?;

        let mut apartment_seen = false;
        let mut targets = Vec::new();
        for id in state.row_ids(project_id) {
            let row = state.row(*id)?.lock()?;
            if row.apartment_id != apartment_id {
                continue;
            }
            apartment_seen = true;
            if range.contains(row.due) {
                targets.push(*id);
            }
        }
        if !apartment_seen {
            return Err(PaymentsError::ApartmentNotFound {
                apartment_id,
                project_id,
            });
        }

        for id in &targets {
            let row = state
                .rows
                .get_mut(id)
                .ok_or(PaymentsError::InstallmentNotFound(*id))?;
            row.get_mut()?.apply_override(settled, at);
        }

        info!(
            %apartment_id,
            %project_id,
            first = %range.first,
            last = %range.last,
            status = %target,
            updated = targets.len(),
            "applied status override"
        );
        Ok(targets.len())
    }

    /// Replaces budget, installment count or start month of a project that has
    /// not received any payment yet, regenerating its schedule from the stored
    /// roster snapshot.
    pub fn revise_project_terms(&self, project_id: Uuid, terms: ProjectTerms) -> Result<Project> {
        let mut state = self.state.write()?;
        let roster = state.active_project(project_id)?.roster.clone();
        if state.has_payments(project_id)? {
            warn!(%project_id, "rejected revision of a project with payments");
            return Err(PaymentsError::ProjectLocked(project_id));
        }

        let allocations = allocate_with(&terms, &roster, &self.config)?;
        state.remove_rows(project_id);
        state.insert_rows(project_id, &allocations);

        let project = state
            .projects
            .get_mut(&project_id)
            .ok_or(PaymentsError::ProjectNotFound(project_id))?;
        project.shares = ApartmentShare::from_allocations(project_id, &allocations);
        project.terms = terms;

        info!(
            %project_id,
            budget_cents = project.terms.budget_cents,
            installments = project.terms.installment_count,
            "revised project terms"
        );
        Ok(project.clone())
    }

    /// Keeps the rows but drops the project from summaries and freezes it.
    pub fn archive_project(&self, project_id: Uuid) -> Result<()> {
        let mut state = self.state.write()?;
        let project = state
            .projects
            .get_mut(&project_id)
            .ok_or(PaymentsError::ProjectNotFound(project_id))?;
        if project.status == ProjectStatus::Deleted {
            return Err(PaymentsError::ProjectInactive(project_id));
        }
        project.status = ProjectStatus::Archived;
        info!(%project_id, "archived project");
        Ok(())
    }

    /// Deletes the project's installments and marks it deleted.
    ///
    /// Returns how many installments were removed.
    pub fn delete_project(&self, project_id: Uuid) -> Result<usize> {
        let mut state = self.state.write()?;
        if state.project(project_id)?.status == ProjectStatus::Deleted {
            return Err(PaymentsError::ProjectInactive(project_id));
        }
        let removed = state.remove_rows(project_id);
        if let Some(project) = state.projects.get_mut(&project_id) {
            project.status = ProjectStatus::Deleted;
        }
        info!(%project_id, removed, "deleted project");
        Ok(removed)
    }

    pub fn project(&self, project_id: Uuid) -> Result<Project> {
        Ok(self.state.read()?.project(project_id)?.clone())
    }

    /// Projects of a building that have not been deleted, oldest first.
    pub fn projects_for_building(&self, building_id: Uuid) -> Result<Vec<Project>> {
        let state = self.state.read()?;
        let mut projects: Vec<Project> = state
            .projects
            .values()
            .filter(|p| p.building_id == building_id && p.status != ProjectStatus::Deleted)
            .cloned()
            .collect();
        projects.sort_by_key(|p| p.created_at);
        Ok(projects)
    }

    pub fn installment(&self, installment_id: Uuid) -> Result<Installment> {
        let state = self.state.read()?;
        let row = state.row(installment_id)?.lock()?;
        Ok(row.clone())
    }

    /// An apartment's schedule within a project, in installment order.
    pub fn installments_for(
        &self,
        project_id: Uuid,
        apartment_id: Uuid,
    ) -> Result<Vec<Installment>> {
        let state = self.state.read()?;
        state.project(project_id)?;
        let mut rows: Vec<Installment> = state
            .snapshot(project_id)?
            .into_iter()
            .filter(|row| row.apartment_id == apartment_id)
            .collect();
        if rows.is_empty() {
            return Err(PaymentsError::ApartmentNotFound {
                apartment_id,
                project_id,
            });
        }
        rows.sort_by_key(|row| row.index);
        Ok(rows)
    }

    /// Balance and overdue figures for `scope` at `as_of`, computed from the rows
    /// as they are right now.
    pub fn status_summary(
        &self,
        scope: SummaryScope,
        as_of: DateTime<Utc>,
    ) -> Result<PaymentStatusSummary> {
        let state = self.state.read()?;
        let mut rows = Vec::new();
        for project in state.projects.values().filter(|p| p.is_active()) {
            rows.extend(state.snapshot(project.id)?);
        }
        summarize(state.projects.values(), &rows, scope, &as_of)
    }
}
