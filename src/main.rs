use assetstore::currency::{format_idr, parse_idr};
use assetstore::qr::{self, Label};
use assetstore::toast::ToastKind;
use assetstore::{
    AssetInput, AssetListController, AssetLocation, AssetRecord, AssetStatus, Config, ControllerError, FormMode,
    InviteRequest, PageButton, Role, Session, Store, UserDirectory,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use eyre::{Context, Result, eyre};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "assetstore")]
#[command(about = "AssetStore CLI - Church asset inventory with QR labels")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to a YAML config file (default: <config dir>/assetstore/assetstore.yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the store (overrides the config file)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// E-mail of the acting user (overrides the config file)
    #[arg(short, long)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List assets, filtered and paginated
    List {
        /// Case-insensitive match on name or specification
        #[arg(long, default_value = "")]
        search: String,

        #[arg(long)]
        status: Option<AssetStatus>,

        #[arg(long)]
        location: Option<AssetLocation>,

        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Rows per page (overrides the config file)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Show the dashboard counts
    Stats {
        /// Highlight one status card (admins only)
        #[arg(long)]
        status: Option<AssetStatus>,
    },

    /// Add an asset
    Add {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "InUse")]
        status: AssetStatus,

        #[command(flatten)]
        fields: AssetFields,
    },

    /// Edit an asset; fields not given keep their current value
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        status: Option<AssetStatus>,

        #[command(flatten)]
        fields: AssetFields,

        /// Remove the stored location
        #[arg(long, conflicts_with = "location")]
        no_location: bool,
    },

    /// Delete one asset
    Delete { id: String },

    /// Delete several assets in one operation
    DeleteMany {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show every field of one asset
    Show { id: String },

    /// Render the QR code for one asset
    Qr {
        id: String,

        /// Write an SVG file instead of drawing in the terminal
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a printable SVG sheet of QR labels
    Print {
        #[arg(required = true)]
        ids: Vec<String>,

        #[arg(short, long, default_value = "qr-labels.svg")]
        output: PathBuf,
    },

    /// Manage user accounts
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Sync SQLite database from JSONL files
    Sync,
}

#[derive(clap::Args)]
struct AssetFields {
    #[arg(long)]
    specification: Option<String>,

    /// Purchase date as YYYY-MM-DD
    #[arg(long)]
    purchase_date: Option<NaiveDate>,

    /// Price in rupiah; separators and the `Rp` prefix are ignored
    #[arg(long, value_parser = parse_idr)]
    price: Option<u64>,

    #[arg(long)]
    notes: Option<String>,

    #[arg(long)]
    location: Option<AssetLocation>,

    #[arg(long)]
    location_detail: Option<String>,
}

impl AssetFields {
    fn apply(self, input: &mut AssetInput) {
        if let Some(specification) = self.specification {
            input.specification = Some(specification);
        }
        if let Some(date) = self.purchase_date {
            input.purchase_date = Some(date);
        }
        if let Some(price) = self.price {
            input.price = Some(price as f64);
        }
        if let Some(notes) = self.notes {
            input.notes = Some(notes);
        }
        if let Some(location) = self.location {
            input.location = Some(location);
        }
        if let Some(detail) = self.location_detail {
            input.location_detail = Some(detail);
        }
    }
}

#[derive(Subcommand)]
enum UserCommands {
    /// List every account (admins only)
    List,

    /// Invite a new user (admins only); the first account must be an admin
    Invite {
        email: String,

        #[arg(long)]
        full_name: Option<String>,

        #[arg(long, default_value = "user")]
        role: Role,
    },

    /// Remove a user (admins only)
    Remove { id: String },
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let store_path = cli.store_path.clone().unwrap_or_else(|| config.store_path.clone());
    let user_email = cli.user.clone().or_else(|| config.user_email.clone());

    // Open store
    let mut store = Store::open(&store_path)?;

    match cli.command {
        Commands::Sync => {
            println!("Syncing database from JSONL files...");
            store.sync_all()?;
            println!("Sync complete");
        }
        Commands::Users { command } => run_users(&mut store, user_email.as_deref(), command)?,
        Commands::Stats { status } => {
            let session = match user_email.as_deref() {
                Some(email) => Some(UserDirectory::new(&mut store).session_for(email)?),
                None => None,
            };
            let mut controller = controller(store, &config, None)?;
            if let Some(status) = status {
                let session = session.as_ref().ok_or_else(|| eyre!("--user is required to filter by status card"))?;
                controller.filter_by_status_card(session, Some(status))?;
            }
            let is_admin = session.as_ref().is_some_and(Session::is_admin);
            for card in controller.stats().cards(controller.filter().status_filter, is_admin) {
                let marker = if card.active { ">" } else { " " };
                let title = match card.status {
                    Some(status) => status_badge(status),
                    None => card.title.bold(),
                };
                println!("{} {:<14} {}", marker, title, card.count);
            }
        }
        command => run_assets(store, &config, command)?,
    }

    Ok(())
}

fn controller(store: Store, config: &Config, page_size: Option<usize>) -> Result<AssetListController<Store>> {
    let mut controller =
        AssetListController::with_settings(store, page_size.unwrap_or(config.page_size), config.toast_ttl());
    controller.refresh()?;
    Ok(controller)
}

fn run_assets(store: Store, config: &Config, command: Commands) -> Result<()> {
    match command {
        Commands::List {
            search,
            status,
            location,
            page,
            page_size,
        } => {
            let mut controller = controller(store, config, page_size)?;
            controller.set_search(search);
            controller.set_status_filter(status);
            controller.set_location_filter(location);
            controller.set_page(page);
            print_list(&controller);
        }
        Commands::Add { name, status, fields } => {
            let mut controller = controller(store, config, None)?;
            let mut input = AssetInput::new(name, status);
            fields.apply(&mut input);
            let result = controller.save(FormMode::Add, &input);
            print_toast(&controller);
            let id = report(result)?;
            println!("{}", id);
        }
        Commands::Edit {
            id,
            name,
            status,
            fields,
            no_location,
        } => {
            let mut controller = controller(store, config, None)?;
            let existing = controller.find(&id).ok_or_else(|| eyre!("Asset not found: {}", id))?;
            let mut input = existing.to_input();
            if let Some(name) = name {
                input.name = name;
            }
            if let Some(status) = status {
                input.status = status;
            }
            fields.apply(&mut input);
            if no_location {
                input.location = None;
            }
            let result = controller.save(FormMode::Edit(id), &input);
            print_toast(&controller);
            report(result)?;
        }
        Commands::Delete { id } => {
            let mut controller = controller(store, config, None)?;
            let result = controller.delete_one(&id);
            print_toast(&controller);
            report(result)?;
        }
        Commands::DeleteMany { ids } => {
            let mut controller = controller(store, config, None)?;
            select(&mut controller, &ids)?;
            let result = controller.delete_selected();
            print_toast(&controller);
            report(result)?;
        }
        Commands::Show { id } => {
            let controller = controller(store, config, None)?;
            let asset = controller.find(&id).ok_or_else(|| eyre!("Asset not found: {}", id))?;
            print_asset(asset);
        }
        Commands::Qr { id, output } => {
            let controller = controller(store, config, None)?;
            let asset = controller.find(&id).ok_or_else(|| eyre!("Asset not found: {}", id))?;
            let code = qr::encode(&asset.id, config.qr.options())?;
            match output {
                Some(path) => {
                    fs::write(&path, code.to_svg()).context(format!("Failed to write {}", path.display()))?;
                    println!("QR code written to {}", path.display());
                }
                None => {
                    println!("{}", code.to_terminal());
                    println!("{}", asset.name.bold());
                    println!("{}", qr::short_id(&asset.id).dimmed());
                }
            }
        }
        Commands::Print { ids, output } => {
            let mut controller = controller(store, config, None)?;
            select(&mut controller, &ids)?;
            let labels: Vec<Label> = controller.selected_labels();
            let sheet = controller.print_selected(config.qr.batch_options())?;
            fs::write(&output, sheet).context(format!("Failed to write {}", output.display()))?;
            println!("{} labels written to {}", labels.len(), output.display());
        }
        Commands::Sync | Commands::Users { .. } | Commands::Stats { .. } => {}
    }

    Ok(())
}

fn run_users(store: &mut Store, user_email: Option<&str>, command: UserCommands) -> Result<()> {
    let mut users = UserDirectory::new(store);

    match command {
        UserCommands::List => {
            let session = session(&users, user_email)?;
            for user in users.list(&session)? {
                println!(
                    "{}  {:<32} {:<6} {}",
                    user.id.dimmed(),
                    user.email,
                    user.role,
                    user.full_name.as_deref().unwrap_or("-")
                );
            }
        }
        UserCommands::Invite { email, full_name, role } => {
            let session = session(&users, user_email)?;
            let profile = users.invite(&session, InviteRequest { email, full_name, role })?;
            println!("{} {} ({})", "Invited".green(), profile.email, profile.role);
        }
        UserCommands::Remove { id } => {
            let session = session(&users, user_email)?;
            users.remove(&session, &id)?;
            println!("{} {}", "Removed".green(), id);
        }
    }

    Ok(())
}

fn session(users: &UserDirectory<'_>, user_email: Option<&str>) -> Result<Session> {
    let email = user_email.ok_or_else(|| eyre!("--user (or user_email in the config file) is required"))?;
    Ok(users.session_for(email)?)
}

fn select(controller: &mut AssetListController<Store>, ids: &[String]) -> Result<()> {
    for id in ids {
        if !controller.toggle_one(id) {
            return Err(eyre!("Asset not found: {}", id));
        }
    }
    Ok(())
}

/// Validation failures are listed per field; everything else goes through eyre
fn report<T>(result: Result<T, ControllerError>) -> Result<T> {
    match result {
        Err(ControllerError::Validation(errors)) => {
            for error in &errors.0 {
                eprintln!("  {}: {}", error.field.bold(), error.message);
            }
            Err(eyre!("Invalid asset"))
        }
        other => Ok(other?),
    }
}

fn print_toast(controller: &AssetListController<Store>) {
    if let Some(toast) = controller.notifier().latest() {
        match toast.kind {
            ToastKind::Success => println!("{}", toast.message.green()),
            ToastKind::Error => eprintln!("{}", toast.message.red()),
        }
    }
}

fn status_badge(status: AssetStatus) -> ColoredString {
    let label = status.label();
    match status {
        AssetStatus::InUse => label.green(),
        AssetStatus::NotInUse => label.bright_black(),
        AssetStatus::Damaged => label.red(),
        AssetStatus::UnderRepair => label.yellow(),
    }
}

fn print_list(controller: &AssetListController<Store>) {
    let view = controller.view();

    if view.filtered_count == 0 {
        if controller.filter().is_empty() {
            println!("No assets yet");
        } else {
            println!("No assets match the current filters");
        }
        return;
    }

    println!(
        "{:<10} {:<28} {:<14} {:<10} {:>16}",
        "ID".bold(),
        "NAME".bold(),
        "STATUS".bold(),
        "LOCATION".bold(),
        "PRICE".bold()
    );
    for asset in &view.page.items {
        println!(
            "{:<10} {:<28} {:<14} {:<10} {:>16}",
            qr::short_id(&asset.id).dimmed(),
            truncate(&asset.name, 28),
            status_badge(asset.status),
            asset.location.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string()),
            format_idr(asset.price)
        );
    }

    println!();
    println!(
        "Showing {}-{} of {}",
        view.page.start_index, view.page.end_index, view.page.total_items
    );
    if view.page.shows_controls() {
        let buttons: Vec<String> = view
            .buttons
            .iter()
            .map(|button| match button {
                PageButton::Page(n) if *n == view.page.current_page => format!("[{}]", n),
                PageButton::Page(n) => n.to_string(),
                PageButton::Ellipsis => "...".to_string(),
            })
            .collect();
        println!("Pages: {}", buttons.join(" "));
    }
}

fn print_asset(asset: &AssetRecord) {
    let or_dash = |value: Option<&str>| value.unwrap_or("-").to_string();

    println!("{:<16} {}", "ID:".bold(), asset.id);
    println!("{:<16} {}", "Name:".bold(), asset.name);
    println!("{:<16} {}", "Status:".bold(), status_badge(asset.status));
    println!("{:<16} {}", "Specification:".bold(), or_dash(asset.specification.as_deref()));
    println!(
        "{:<16} {}",
        "Purchase date:".bold(),
        asset.purchase_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
    );
    println!("{:<16} {}", "Price:".bold(), format_idr(asset.price));
    println!(
        "{:<16} {}",
        "Location:".bold(),
        asset.location.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string())
    );
    println!("{:<16} {}", "Location detail:".bold(), or_dash(asset.location_detail.as_deref()));
    println!("{:<16} {}", "Notes:".bold(), or_dash(asset.notes.as_deref()));
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
        out.push_str("...");
        out
    }
}
