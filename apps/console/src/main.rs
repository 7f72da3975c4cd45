use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use client_core::{
    list_view::DEFAULT_PAGE_SIZE, ClientError, Dashboard, DashboardEvent, HttpDashboardApi,
    ListPage, NotificationLevel, SortColumn, UserForm, RESERVED_ROLE,
};
use shared::{
    domain::{CompanyId, EntityKind, Uid, UserRecord},
    protocol::{ListFilters, LookupItem},
};
use tokio::sync::broadcast;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_session, load_settings, CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "dashboard-console", about = "Manage admin and anggota accounts")]
struct Cli {
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,
    /// Overrides `api_base_url` from the config file and environment.
    #[arg(long)]
    api_base_url: Option<String>,
    #[arg(long)]
    session_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List {
        kind: EntityKind,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
        #[arg(long, requires = "sort")]
        desc: bool,
    },
    Show {
        uid: String,
    },
    Create {
        kind: EntityKind,
        #[command(flatten)]
        fields: FormArgs,
    },
    Update {
        kind: EntityKind,
        uid: String,
        #[command(flatten)]
        fields: FormArgs,
    },
    Delete {
        kind: EntityKind,
        uid: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    Lookup {
        #[arg(value_enum)]
        table: LookupTable,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    #[arg(long)]
    q: Option<String>,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    company: Option<String>,
}

impl From<FilterArgs> for ListFilters {
    fn from(args: FilterArgs) -> Self {
        ListFilters {
            q: args.q,
            role: args.role,
            status: args.status,
            company: args.company,
        }
    }
}

#[derive(Args, Debug, Default)]
struct FormArgs {
    #[arg(long)]
    nik: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    password: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    dob: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    phone_number: Option<String>,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    company_id: Option<String>,
}

impl FormArgs {
    /// Writes every flag that was given over `form`, leaving the rest as is.
    fn overlay(self, form: &mut UserForm) {
        let text_fields = [
            (self.nik, &mut form.nik),
            (self.email, &mut form.email),
            (self.full_name, &mut form.full_name),
            (self.password, &mut form.password),
            (self.dob, &mut form.dob),
            (self.address, &mut form.address),
            (self.phone_number, &mut form.phone_number),
        ];
        for (value, slot) in text_fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
        if self.role.is_some() {
            form.role = self.role;
        }
        if let Some(company_id) = self.company_id {
            form.company_id = Some(CompanyId::new(company_id));
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Nik,
    FullName,
    Email,
    Role,
    PhoneNumber,
    Status,
}

impl From<SortArg> for SortColumn {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Nik => SortColumn::Nik,
            SortArg::FullName => SortColumn::FullName,
            SortArg::Email => SortColumn::Email,
            SortArg::Role => SortColumn::Role,
            SortArg::PhoneNumber => SortColumn::PhoneNumber,
            SortArg::Status => SortColumn::Status,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LookupTable {
    Roles,
    /// Roles offered on the admin create form.
    AssignableRoles,
    States,
    Statuses,
    Companies,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(&cli.config);
    if let Some(url) = cli.api_base_url {
        settings.api_base_url = url;
    }
    if let Some(path) = cli.session_file {
        settings.session_file = path;
    }
    debug!(?settings, "loaded settings");

    let session = load_session(&settings.session_file)?;
    let api = HttpDashboardApi::with_timeout(&settings.api_base_url, settings.request_timeout())?;
    let dashboard = Dashboard::new(Arc::new(api), session);
    let mut events = dashboard.subscribe_events();

    let result = run(&dashboard, cli.command).await;
    report_events(&mut events);
    result
}

async fn run(dashboard: &Dashboard, command: Command) -> Result<()> {
    match command {
        Command::List {
            kind,
            filters,
            page,
            page_size,
            sort,
            desc,
        } => {
            let mut view = dashboard.filtered_list_view(kind, filters.into());
            if !view.set_page_size(page_size) {
                bail!("page size must be one of 10, 25, 50 or 100");
            }
            if let Some(sort) = sort {
                view.sort_by(sort.into());
                if desc {
                    view.sort_by(sort.into());
                }
            }
            view.set_page(page);
            view.mount().await?;
            print_page(kind, &view.rows().await);
        }
        Command::Show { uid } => {
            let record = dashboard
                .api()
                .find_user(dashboard.session(), &Uid::new(uid))
                .await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Create { kind, fields } => {
            let mut form = UserForm::default();
            fields.overlay(&mut form);
            submit(dashboard.submit_create(kind, &form).await)?;
        }
        Command::Update { kind, uid, fields } => {
            if kind.update_path().is_none() {
                bail!("{kind} records cannot be updated");
            }
            let uid = Uid::new(uid);
            let mut form = dashboard.edit_form(&uid).await?.form;
            fields.overlay(&mut form);
            submit(dashboard.submit_update(kind, &uid, &form).await)?;
        }
        Command::Delete { kind, uid, yes } => {
            let mut view = dashboard.list_view(kind);
            view.mount().await?;
            let confirmation = view.request_delete(Uid::new(uid));
            if !yes && !confirm(confirmation.title, confirmation.text)? {
                view.cancel_delete();
                println!("Cancelled");
                return Ok(());
            }
            let outcome = view.confirm_delete().await?;
            info!(kind = %kind, uid = %confirmation.uid, ?outcome, "delete finished");
        }
        Command::Lookup { table } => {
            let session = dashboard.session();
            let api = dashboard.api();
            let items = match table {
                LookupTable::Roles => api.roles(session).await?,
                LookupTable::AssignableRoles => api.roles_excluding(session, RESERVED_ROLE).await?,
                LookupTable::States => api.states(session).await?,
                LookupTable::Statuses => api.statuses(session).await?,
                LookupTable::Companies => {
                    api.companies(session, &session.profile.company_id).await?
                }
            };
            print_lookup(&items);
        }
    }
    Ok(())
}

/// Prints field errors one per line before failing the command.
fn submit(result: Result<(), ClientError>) -> Result<()> {
    match result {
        Err(ClientError::Validation(errors)) => {
            for (field, message) in errors.iter() {
                eprintln!("{}: {message}", field.label());
            }
            bail!("form has {} invalid field(s)", errors.len());
        }
        other => Ok(other?),
    }
}

fn confirm(title: &str, text: &str) -> Result<bool> {
    print!("{title} {text} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn report_events(events: &mut broadcast::Receiver<DashboardEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            DashboardEvent::Notification(note) => match note.level {
                NotificationLevel::Success => println!("{}", note.message),
                NotificationLevel::Error => eprintln!("{}", note.message),
            },
            DashboardEvent::Navigate(route) => debug!(?route, "navigation requested"),
        }
    }
}

fn print_page(kind: EntityKind, page: &ListPage) {
    println!(
        "{:>4}  {:<18}  {:<24}  {:<28}  {:<12}  {:<14}  {}",
        "No",
        "NIK",
        "Full Name",
        "Email",
        "Role",
        "Phone",
        status_header(kind)
    );
    for row in &page.rows {
        let record = &row.record;
        println!(
            "{:>4}  {:<18}  {:<24}  {:<28}  {:<12}  {:<14}  {}",
            row.no,
            record.nik,
            record.full_name,
            record.email,
            record.role.as_deref().unwrap_or("-"),
            record.phone_number.as_deref().unwrap_or("-"),
            status_cell(kind, record).unwrap_or("-"),
        );
    }
    println!(
        "page {}/{} ({} rows, backend total {})",
        page.page + 1,
        page.page_count,
        page.row_count,
        page.total
    );
}

fn status_header(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Admin => "State",
        EntityKind::Anggota => "Status",
    }
}

fn status_cell(kind: EntityKind, record: &UserRecord) -> Option<&str> {
    match kind {
        EntityKind::Admin => record.state.as_deref(),
        EntityKind::Anggota => record.status.as_deref(),
    }
}

fn print_lookup(items: &[LookupItem]) {
    for item in items {
        match &item.id {
            Some(id) if *id != item.name => println!("{id}\t{}", item.name),
            _ => println!("{}", item.name),
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
