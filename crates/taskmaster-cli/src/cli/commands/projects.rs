//! Project command handlers, driven through the dashboard controller.

use anyhow::{Result, bail};
use taskmaster_core::dashboard::{DashboardController, DashboardState};
use taskmaster_core::http::HttpClient;
use taskmaster_core::projects::{Project, ProjectDraft, ProjectGateway, ProjectId};

use super::report;

const NOT_LOGGED_IN: &str = "Not logged in. Run `taskmaster login` first.";

/// Enters the dashboard; bails out the way the UI would redirect to login.
///
/// A list failure other than a rejected session only warns: the controller
/// is `Ready` and still accepts mutations.
async fn open_dashboard(client: HttpClient) -> Result<DashboardController> {
    let dashboard = DashboardController::new(client);
    let entered = dashboard.enter().await;
    match entered {
        Ok(DashboardState::Unauthenticated) => bail!(NOT_LOGGED_IN),
        Ok(_) => {}
        Err(err) => eprintln!("warning: could not load projects: {}", err.user_message()),
    }
    Ok(dashboard)
}

fn print_projects(projects: &[Project]) {
    if projects.is_empty() {
        println!("No projects yet.");
        return;
    }
    for project in projects {
        let created = project
            .created_date()
            .map_or_else(|| "unknown".to_string(), |d| d.to_string());
        println!(
            "{:>5}  {}  [{}]  created {}",
            project.id, project.name, project.status, created
        );
    }
}

fn print_refresh_warning(dashboard: &DashboardController) {
    if let Some(err) = dashboard.last_refresh_error() {
        eprintln!("warning: could not reload projects: {}", err.user_message());
    }
}

pub async fn list(client: HttpClient) -> Result<()> {
    let dashboard = DashboardController::new(client);
    let entered = dashboard.enter().await;
    match entered {
        Ok(DashboardState::Unauthenticated) => bail!(NOT_LOGGED_IN),
        Ok(_) => {
            print_projects(&dashboard.projects());
            Ok(())
        }
        Err(err) => Err(report(err)),
    }
}

pub async fn show(client: HttpClient, id: ProjectId) -> Result<()> {
    if !client.store().is_authenticated() {
        bail!(NOT_LOGGED_IN);
    }
    let project = ProjectGateway::new(client).get(id).await.map_err(report)?;

    println!("{}  {}", project.id, project.name);
    println!("status:  {}", project.status);
    if let Some(description) = project.description.as_deref().filter(|d| !d.is_empty()) {
        println!("about:   {description}");
    }
    println!("created: {}", project.created_at);
    println!("updated: {}", project.updated_at);
    Ok(())
}

pub async fn create(client: HttpClient, name: String, description: Option<String>) -> Result<()> {
    let dashboard = open_dashboard(client).await?;
    dashboard.open_create();

    let draft = ProjectDraft { name, description };
    let project = dashboard.submit(&draft).await.map_err(report)?;

    println!("Created project {} ({})", project.name, project.id);
    print_refresh_warning(&dashboard);
    print_projects(&dashboard.projects());
    Ok(())
}

pub async fn update(
    client: HttpClient,
    id: ProjectId,
    name: String,
    description: Option<String>,
) -> Result<()> {
    let dashboard = open_dashboard(client).await?;

    // Unknown ids still go to the server so its error is shown verbatim.
    let project = match dashboard.open_edit(id) {
        Some(current) => {
            let draft = ProjectDraft {
                name,
                description: description.or(current.description),
            };
            dashboard.submit(&draft).await
        }
        None => {
            let draft = ProjectDraft { name, description };
            dashboard.update(id, &draft).await
        }
    }
    .map_err(report)?;

    println!("Updated project {} ({})", project.name, project.id);
    print_refresh_warning(&dashboard);
    print_projects(&dashboard.projects());
    Ok(())
}

pub async fn delete(client: HttpClient, id: ProjectId) -> Result<()> {
    let dashboard = open_dashboard(client).await?;
    dashboard.delete(id).await.map_err(report)?;

    println!("Deleted project {id}");
    print_refresh_warning(&dashboard);
    print_projects(&dashboard.projects());
    Ok(())
}
