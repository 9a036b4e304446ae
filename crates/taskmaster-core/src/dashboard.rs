//! Dashboard controller: session guard, project list, and mutation workflow.
//!
//! The controller holds the only client-side copy of the project list. It is
//! never patched in place: every confirmed mutation invalidates the list and
//! reloads it from the server, so what is displayed always matches server
//! state after a mutation.
//!
//! One action (initial load or a mutation with its reload) may be in flight at
//! a time. Intents issued while another is outstanding fail with
//! [`ApiError::Busy`] without touching the network. Logout bumps an epoch so
//! results of requests started before it are discarded.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::http::HttpClient;
use crate::projects::{Project, ProjectDraft, ProjectGateway, ProjectId, ProjectList};
use crate::session::{SessionStore, User};

/// Lifecycle of the dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardState {
    /// Waiting for the project list.
    Loading,
    /// Project list available; mutations accepted.
    Ready,
    /// No valid session. The presentation layer should navigate to login.
    Unauthenticated,
}

/// Create/edit form state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Editor {
    #[default]
    Closed,
    Creating,
    Editing(Project),
}

#[derive(Debug)]
struct Inner {
    state: DashboardState,
    user: Option<User>,
    projects: ProjectList,
    editor: Editor,
    in_flight: Option<u64>,
    next_ticket: u64,
    epoch: u64,
    last_refresh_error: Option<ApiError>,
}

impl Inner {
    fn become_unauthenticated(&mut self) {
        self.state = DashboardState::Unauthenticated;
        self.user = None;
        self.projects.clear();
        self.editor = Editor::Closed;
        self.last_refresh_error = None;
        self.epoch += 1;
    }
}

/// Releases the admission slot on drop, including when the owning future is
/// dropped mid-request.
struct Admission<'a> {
    controller: &'a DashboardController,
    ticket: u64,
    epoch: u64,
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        let mut inner = self.controller.lock();
        if inner.in_flight == Some(self.ticket) {
            inner.in_flight = None;
        }
    }
}

pub struct DashboardController {
    store: Arc<dyn SessionStore>,
    gateway: ProjectGateway,
    inner: Mutex<Inner>,
}

impl DashboardController {
    /// Creates a controller over `client`'s backend and session store.
    pub fn new(client: HttpClient) -> Self {
        let store = Arc::clone(client.store());
        Self {
            store,
            gateway: ProjectGateway::new(client),
            inner: Mutex::new(Inner {
                state: DashboardState::Loading,
                user: None,
                projects: Vec::new(),
                editor: Editor::Closed,
                in_flight: None,
                next_ticket: 0,
                epoch: 0,
                last_refresh_error: None,
            }),
        }
    }

    pub fn state(&self) -> DashboardState {
        self.lock().state
    }

    pub fn projects(&self) -> ProjectList {
        self.lock().projects.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    pub fn editor(&self) -> Editor {
        self.lock().editor.clone()
    }

    /// True while an action is outstanding; controls should be disabled.
    pub fn is_busy(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    /// Error from the most recent post-mutation reload, if it failed.
    pub fn last_refresh_error(&self) -> Option<ApiError> {
        self.lock().last_refresh_error.clone()
    }

    /// Guards the view and loads projects.
    ///
    /// Returns `Unauthenticated` (not an error) when there is no session or
    /// the server rejects it; the caller should navigate to the entry screen.
    /// May be called again to reload.
    ///
    /// # Errors
    /// `Busy` if another action is in flight. Any other list failure is
    /// returned after transitioning to `Ready`; the list keeps its previous
    /// contents, which are empty on first entry.
    pub async fn enter(&self) -> ApiResult<DashboardState> {
        let Some(session) = self.store.get() else {
            info!("no session; leaving dashboard");
            self.lock().become_unauthenticated();
            return Ok(DashboardState::Unauthenticated);
        };

        let admission = self.admit()?;
        {
            let mut inner = self.lock();
            inner.state = DashboardState::Loading;
            inner.user = Some(session.user);
        }

        let result = self.gateway.list().await;
        self.apply_initial_list(&admission, result)
    }

    /// Creates a project and reloads the list.
    ///
    /// # Errors
    /// See [`DashboardController::update`].
    pub async fn create(&self, draft: &ProjectDraft) -> ApiResult<Project> {
        draft.validate()?;
        let admission = self.admit_mutation()?;
        let result = self.gateway.create(draft).await;
        let project = self.settle(&admission, result)?;
        self.reload_after_mutation(&admission).await?;
        Ok(project)
    }

    /// Updates a project and reloads the list.
    ///
    /// # Errors
    /// `Validation` for an invalid draft, `Busy` while another action is in
    /// flight, `AuthRejected` when signed out, or the gateway error. On any
    /// error the project list is left untouched.
    pub async fn update(&self, id: ProjectId, draft: &ProjectDraft) -> ApiResult<Project> {
        draft.validate()?;
        let admission = self.admit_mutation()?;
        let result = self.gateway.update(id, draft).await;
        let project = self.settle(&admission, result)?;
        self.reload_after_mutation(&admission).await?;
        Ok(project)
    }

    /// # Errors
    /// See [`DashboardController::update`].
    pub async fn delete(&self, id: ProjectId) -> ApiResult<()> {
        let admission = self.admit_mutation()?;
        let result = self.gateway.delete(id).await;
        self.settle(&admission, result)?;
        self.reload_after_mutation(&admission).await
    }

    pub fn open_create(&self) {
        self.lock().editor = Editor::Creating;
    }

    /// Opens the editor on a listed project and returns its prefilled draft.
    pub fn open_edit(&self, id: ProjectId) -> Option<ProjectDraft> {
        let mut inner = self.lock();
        let project = inner.projects.iter().find(|p| p.id == id)?.clone();
        let draft = project.to_draft();
        inner.editor = Editor::Editing(project);
        Some(draft)
    }

    pub fn close_editor(&self) {
        self.lock().editor = Editor::Closed;
    }

    /// Submits the editor: updates the project being edited, otherwise
    /// creates a new one. The editor closes only on success.
    ///
    /// # Errors
    /// Same as `create`/`update`.
    pub async fn submit(&self, draft: &ProjectDraft) -> ApiResult<Project> {
        let target = match self.editor() {
            Editor::Editing(project) => Some(project.id),
            Editor::Closed | Editor::Creating => None,
        };

        let project = match target {
            Some(id) => self.update(id, draft).await?,
            None => self.create(draft).await?,
        };

        self.close_editor();
        Ok(project)
    }

    /// Clears the session and leaves the dashboard, regardless of anything
    /// in flight.
    ///
    /// # Errors
    /// `Storage` if the persisted session could not be removed. The
    /// controller is `Unauthenticated` either way.
    pub fn logout(&self) -> ApiResult<()> {
        let cleared = self.store.clear();
        {
            let mut inner = self.lock();
            inner.in_flight = None;
            inner.become_unauthenticated();
        }
        info!("logged out from dashboard");
        cleared.map_err(|e| ApiError::Storage(format!("{e:#}")))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn admit(&self) -> ApiResult<Admission<'_>> {
        let mut inner = self.lock();
        if inner.in_flight.is_some() {
            debug!("rejecting intent; another action is in flight");
            return Err(ApiError::Busy);
        }
        inner.next_ticket += 1;
        let ticket = inner.next_ticket;
        inner.in_flight = Some(ticket);
        Ok(Admission {
            controller: self,
            ticket,
            epoch: inner.epoch,
        })
    }

    fn admit_mutation(&self) -> ApiResult<Admission<'_>> {
        match self.state() {
            DashboardState::Ready => self.admit(),
            DashboardState::Loading => Err(ApiError::Busy),
            DashboardState::Unauthenticated => {
                Err(ApiError::AuthRejected("Not signed in".to_string()))
            }
        }
    }

    fn apply_initial_list(
        &self,
        admission: &Admission<'_>,
        result: ApiResult<ProjectList>,
    ) -> ApiResult<DashboardState> {
        let mut inner = self.lock();
        if inner.epoch != admission.epoch {
            debug!("discarding stale project list");
            return Ok(inner.state);
        }

        match result {
            Ok(projects) => {
                debug!(count = projects.len(), "project list loaded");
                inner.projects = projects;
                inner.state = DashboardState::Ready;
                inner.last_refresh_error = None;
                Ok(DashboardState::Ready)
            }
            Err(err) if err.is_auth_rejected() => {
                inner.become_unauthenticated();
                Ok(DashboardState::Unauthenticated)
            }
            Err(err) => {
                warn!(error = %err, "failed to load projects");
                inner.state = DashboardState::Ready;
                Err(err)
            }
        }
    }

    /// Maps a mutation result onto controller state. Failures leave the
    /// project list untouched.
    fn settle<T>(&self, admission: &Admission<'_>, result: ApiResult<T>) -> ApiResult<T> {
        if let Err(err) = &result {
            if err.is_auth_rejected() {
                let mut inner = self.lock();
                if inner.epoch == admission.epoch {
                    inner.become_unauthenticated();
                }
            } else {
                warn!(error = %err, "project mutation failed");
            }
        }
        result
    }

    async fn reload_after_mutation(&self, admission: &Admission<'_>) -> ApiResult<()> {
        if self.lock().epoch != admission.epoch {
            debug!("skipping reload; session ended during mutation");
            return Ok(());
        }

        let result = self.gateway.list().await;

        let mut inner = self.lock();
        if inner.epoch != admission.epoch {
            debug!("discarding stale project list");
            return Ok(());
        }

        match result {
            Ok(projects) => {
                inner.projects = projects;
                inner.state = DashboardState::Ready;
                inner.last_refresh_error = None;
                Ok(())
            }
            Err(err) if err.is_auth_rejected() => {
                inner.become_unauthenticated();
                Err(err)
            }
            Err(err) => {
                warn!(error = %err, "reload after mutation failed; keeping previous list");
                inner.last_refresh_error = Some(err);
                Ok(())
            }
        }
    }
}

impl fmt::Debug for DashboardController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardController")
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}
