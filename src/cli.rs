use clap::{Args, Parser, Subcommand, ValueEnum};
use eventify::adapters::FileStore;
use eventify::api::{ApiClient, DEFAULT_BASE_URL};
use eventify::config::{AppConfig, DEFAULT_APP_NAME, default_state_path};
use eventify::notifications::TestNotificationOutcome;
use eventify::session::{AuthContext, HeaderSource, LoginOutcome};
use eventify::types::event::{Event, EventDraft, EventId, is_registered_for};
use eventify::types::notification::Permission;
use eventify::types::preferences::PreferenceFlag;
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use time::Date;
use time::macros::format_description;
use tracing::info;

const DEFAULT_WORKER_ADDR: &str = "127.0.0.1:3001";

pub(crate) enum RunOutcome {
    Serve(AppConfig),
    Exit(i32),
}

pub(crate) async fn run() -> RunOutcome {
    let cli = Cli::parse();
    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return RunOutcome::Exit(2);
        }
    };
    if let Command::Worker = cli.command {
        return RunOutcome::Serve(config);
    }
    RunOutcome::Exit(run_command(cli.command, config).await)
}

#[derive(Parser, Debug)]
#[command(name = "eventify", version, about = "Eventify event client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[arg(long, env = "EVENTIFY_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,
    #[arg(long, env = "EVENTIFY_STATE_PATH")]
    state_path: Option<PathBuf>,
    #[arg(long, env = "EVENTIFY_APP_NAME", default_value = DEFAULT_APP_NAME)]
    app_name: String,
    /// Notification permission before any prompt is answered.
    #[arg(long, env = "EVENTIFY_PERMISSION", default_value = "default")]
    permission: Permission,
    #[arg(long, env = "EVENTIFY_DESKTOP_NOTIFICATIONS")]
    desktop_notifications: bool,
    #[arg(long, env = "EVENTIFY_WORKER_ADDR", default_value = DEFAULT_WORKER_ADDR)]
    worker_addr: SocketAddr,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        username: String,
        #[arg(long, env = "EVENTIFY_PASSWORD")]
        password: String,
    },
    Register {
        username: String,
        email: String,
        #[arg(long, env = "EVENTIFY_PASSWORD")]
        password: String,
    },
    Logout,
    Whoami,
    Events,
    Event {
        id: EventId,
    },
    /// Register for an event.
    Join {
        id: EventId,
    },
    Registrations,
    #[command(subcommand)]
    Prefs(PrefsCommand),
    #[command(subcommand)]
    Push(PushCommand),
    TestNotification,
    History {
        #[arg(long)]
        delete: Option<i64>,
    },
    #[command(subcommand)]
    Admin(AdminCommand),
    Analytics {
        #[arg(long, default_value = "month")]
        timeframe: String,
    },
    /// Schedule reminders for my registrations and wait for them.
    Remind,
    /// Serve the background worker intake.
    Worker,
}

#[derive(Subcommand, Debug)]
enum PrefsCommand {
    Show,
    Set { flag: PreferenceFlag, value: Toggle },
}

#[derive(Subcommand, Debug)]
enum PushCommand {
    Enable,
    Disable,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    Stats,
    Events {
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
    Create(EventArgs),
    Update {
        id: EventId,
        #[command(flatten)]
        event: EventArgs,
    },
    Delete {
        id: EventId,
    },
}

#[derive(Args, Debug, Clone)]
struct EventArgs {
    #[arg(long)]
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    /// `YYYY-MM-DD`
    #[arg(long)]
    date: String,
    /// `HH:MM`
    #[arg(long)]
    time: String,
    #[arg(long)]
    location: String,
    #[arg(long)]
    capacity: i64,
    #[arg(long)]
    category: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
    On,
    Off,
}

fn resolve_config(cli: &Cli) -> Result<AppConfig, String> {
    let api_base_url = cli.api_url.trim();
    if api_base_url.is_empty() {
        return Err("api url cannot be empty".to_string());
    }
    if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
        return Err(format!("invalid api url '{api_base_url}'; expected http(s)://"));
    }
    let app_name = cli.app_name.trim();
    if app_name.is_empty() {
        return Err("app name cannot be empty".to_string());
    }

    Ok(AppConfig {
        app_name: app_name.to_string(),
        api_base_url: api_base_url.to_string(),
        state_path: cli.state_path.clone().unwrap_or_else(default_state_path),
        worker_addr: cli.worker_addr,
        permission: cli.permission,
        desktop_notifications: cli.desktop_notifications,
    })
}

fn event_draft(args: EventArgs) -> Result<EventDraft, String> {
    Date::parse(args.date.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| format!("invalid date '{}'; expected YYYY-MM-DD", args.date))?;
    time::Time::parse(args.time.trim(), format_description!("[hour]:[minute]"))
        .map_err(|_| format!("invalid time '{}'; expected HH:MM", args.time))?;
    if args.title.trim().is_empty() {
        return Err("title cannot be empty".to_string());
    }
    if args.capacity <= 0 {
        return Err("capacity must be greater than 0".to_string());
    }

    Ok(EventDraft {
        title: args.title.trim().to_string(),
        description: args.description,
        date: EventDraft::combine_date_time(&args.date, &args.time),
        location: args.location.trim().to_string(),
        capacity: args.capacity,
        category: args.category,
    })
}

fn format_event(event: &Event) -> String {
    format!(
        "#{} {} | {} | {} | {}/{} spots left",
        event.id,
        event.title,
        event.date,
        event.location.as_deref().unwrap_or("-"),
        event.available_spots(),
        event.capacity
    )
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(raw) => {
            println!("{raw}");
            0
        }
        Err(err) => {
            eprintln!("failed to render response: {err}");
            1
        }
    }
}

fn fail(err: impl std::fmt::Display) -> i32 {
    eprintln!("error: {err}");
    1
}

async fn run_command(command: Command, config: AppConfig) -> i32 {
    let api = ApiClient::new(&config.api_base_url);
    let mut session = AuthContext::load(FileStore::new(&config.state_path), api.clone());

    match command {
        Command::Login { username, password } => match session.login(&username, &password).await {
            LoginOutcome::Success(user) => {
                println!("Logged in as {}", user.username);
                0
            }
            LoginOutcome::Failure(message) => fail(message),
        },
        Command::Register {
            username,
            email,
            password,
        } => {
            let outcome = session.register(&username, &email, &password).await;
            if outcome.success {
                println!("{}", outcome.message);
                0
            } else {
                fail(outcome.message)
            }
        }
        Command::Logout => {
            session.logout();
            println!("Logged out");
            0
        }
        Command::Whoami => match session.user() {
            Some(user) => {
                let role = if user.is_admin { "admin" } else { "user" };
                println!("{} ({role})", user.username);
                0
            }
            None => {
                println!("Not logged in");
                1
            }
        },
        Command::Events => match api.list_events().await {
            Ok(events) => {
                for event in &events {
                    println!("{}", format_event(event));
                }
                0
            }
            Err(err) => fail(err.user_message("Failed to fetch events")),
        },
        Command::Event { id } => {
            let event = match api.event(id).await {
                Ok(event) => event,
                Err(err) => return fail(err.user_message("Event not found")),
            };
            println!("{}", format_event(&event));
            if let Some(description) = event.description.as_deref() {
                println!("{description}");
            }
            if session.is_authenticated()
                && let Ok(registrations) = api.my_registrations(session.auth_headers()).await
                && is_registered_for(&registrations, id)
            {
                println!("You are registered for this event.");
            }
            0
        }
        Command::Join { id } => {
            if !session.is_authenticated() {
                return fail("login required");
            }
            match api.register_for_event(session.auth_headers(), id).await {
                Ok(response) => {
                    println!(
                        "{}",
                        response
                            .message
                            .as_deref()
                            .unwrap_or("Successfully registered for the event!")
                    );
                    0
                }
                Err(err) => fail(err.user_message("Failed to register for event")),
            }
        }
        Command::Registrations => match api.my_registrations(session.auth_headers()).await {
            Ok(events) => {
                for event in &events {
                    println!("{}", format_event(event));
                }
                0
            }
            Err(err) => fail(err.user_message("Failed to fetch registrations")),
        },
        Command::Prefs(prefs) => {
            let service = eventify::notification_service(&config);
            match prefs {
                PrefsCommand::Show => {
                    let preferences = service.notification_preferences(&session).await;
                    print_json(&preferences)
                }
                PrefsCommand::Set { flag, value } => {
                    let mut preferences = service.notification_preferences(&session).await;
                    preferences.set(flag, value == Toggle::On);
                    match service
                        .save_notification_preferences(&session, &preferences)
                        .await
                    {
                        Ok(()) => {
                            println!("Preferences saved successfully!");
                            0
                        }
                        Err(err) => fail(err),
                    }
                }
            }
        }
        Command::Push(push) => {
            let service = eventify::notification_service(&config);
            let result = match push {
                PushCommand::Enable => {
                    if let Err(err) = service.request_permission().await {
                        return fail(err);
                    }
                    service.enable_push_notifications(&session).await
                }
                PushCommand::Disable => service.disable_push_notifications(&session).await,
            };
            match result {
                Ok(()) => {
                    println!("Push notifications updated");
                    0
                }
                Err(err) => fail(err),
            }
        }
        Command::TestNotification => {
            let service = eventify::notification_service(&config);
            let outcome = service.send_test_notification(&session).await;
            if outcome == TestNotificationOutcome::LocalFallback {
                info!("server unavailable, notification shown locally");
            }
            println!("{}", outcome.message());
            0
        }
        Command::History { delete } => {
            if let Some(id) = delete {
                return match api.delete_notification(session.auth_headers(), id).await {
                    Ok(()) => {
                        println!("Notification {id} deleted");
                        0
                    }
                    Err(err) => fail(err.user_message("Failed to delete notification")),
                };
            }
            match api.notifications(session.auth_headers()).await {
                Ok(records) => {
                    for record in &records {
                        let marker = if record.read { " " } else { "*" };
                        println!(
                            "{marker} #{} {} - {}",
                            record.id,
                            record.title.as_deref().unwrap_or("Notification"),
                            record.message.as_deref().unwrap_or("")
                        );
                    }
                    0
                }
                Err(err) => fail(err.user_message("Failed to fetch notifications")),
            }
        }
        Command::Admin(admin) => run_admin(admin, &api, &session).await,
        Command::Analytics { timeframe } => {
            match api.analytics(session.auth_headers(), &timeframe).await {
                Ok(stats) => print_json(&stats),
                Err(err) => fail(err.user_message("Failed to fetch analytics")),
            }
        }
        Command::Remind => run_remind(&config, &api, &session).await,
        Command::Worker => 0,
    }
}

async fn run_admin(admin: AdminCommand, api: &ApiClient, auth: &impl HeaderSource) -> i32 {
    let headers = auth.auth_headers();
    match admin {
        AdminCommand::Stats => match api.admin_stats(headers).await {
            Ok(stats) => print_json(&stats),
            Err(err) => fail(err.user_message("Failed to fetch stats")),
        },
        AdminCommand::Events { limit } => match api.admin_events(headers, Some(limit)).await {
            Ok(events) => {
                for event in &events {
                    println!("{}", format_event(event));
                }
                0
            }
            Err(err) => fail(err.user_message("Failed to fetch events")),
        },
        AdminCommand::Create(args) => {
            let draft = match event_draft(args) {
                Ok(draft) => draft,
                Err(err) => return fail(err),
            };
            match api.create_event(headers, &draft).await {
                Ok(_) => {
                    println!("Event created successfully!");
                    0
                }
                Err(err) => fail(err.user_message("Failed to create event")),
            }
        }
        AdminCommand::Update { id, event } => {
            let draft = match event_draft(event) {
                Ok(draft) => draft,
                Err(err) => return fail(err),
            };
            match api.update_event(headers, id, &draft).await {
                Ok(_) => {
                    println!("Event updated successfully!");
                    0
                }
                Err(err) => fail(err.user_message("Failed to update event")),
            }
        }
        AdminCommand::Delete { id } => match api.delete_event(headers, id).await {
            Ok(()) => {
                println!("Event deleted");
                0
            }
            Err(err) => fail(err.user_message("Failed to delete event")),
        },
    }
}

async fn run_remind(config: &AppConfig, api: &ApiClient, auth: &impl HeaderSource) -> i32 {
    let service = eventify::notification_service(config);
    match service.request_permission().await {
        Ok(true) => {}
        Ok(false) => return fail("notifications not permitted"),
        Err(err) => return fail(err),
    }
    let registrations = match api.my_registrations(auth.auth_headers()).await {
        Ok(registrations) => registrations,
        Err(err) => return fail(err.user_message("Failed to fetch registrations")),
    };

    let handles = service.schedule_user_event_reminders(&registrations);
    if handles.is_empty() {
        println!("No upcoming reminders to schedule.");
        return 0;
    }
    for handle in &handles {
        println!(
            "Reminder for #{} {} at {}",
            handle.reminder.event_id, handle.reminder.event_title, handle.fire_at
        );
    }
    info!(count = handles.len(), "waiting for reminders");

    let wait_all = async {
        for handle in handles {
            let _ = handle.join().await;
        }
    };
    tokio::select! {
        _ = wait_all => {}
        _ = tokio::signal::ctrl_c() => info!("interrupted, dropping pending reminders"),
    }
    0
}
