use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use storefront_onboard::config::AppConfig;
use storefront_onboard::flow::{
    AssistantScreen, IngestionScreen, LoginScreen, OnboardingFlow, OrdersScreen, Screen,
};
use storefront_onboard::flow::orders::display_date;
use storefront_onboard::onboarding::{OnboardingRouteState, onboarding_routes};

/// Line-oriented stdin reader.
struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `label` and read one trimmed line. `None` on EOF or `/quit`.
    async fn ask(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        eprint!("{label}");
        match self.lines.next_line().await? {
            Some(line) if line.trim() == "/quit" => Ok(None),
            Some(line) => Ok(Some(line.trim().to_string())),
            None => Ok(None),
        }
    }
}

/// What the driver should do after a screen returns.
enum Next {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    eprintln!("🛍️  Storefront onboarding v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Gateway: {:?}", config.gateway.backend);
    eprintln!("   Storage: {:?}", config.storage.backend);

    // ── Session ──────────────────────────────────────────────────────────
    let flow = OnboardingFlow::from_config(&config)
        .await
        .context("failed to start onboarding session")?;

    // ── Status routes ────────────────────────────────────────────────────
    if let Some(port) = config.status_port {
        let app = onboarding_routes(OnboardingRouteState {
            store: Arc::clone(flow.store()),
        });
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
            .await
            .with_context(|| format!("failed to bind status port {port}"))?;
        eprintln!("   Status API: http://0.0.0.0:{port}/api/onboarding/status");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Status server stopped: {}", e);
            }
        });
    }
    eprintln!("   Type /quit to exit, /logout to start over.\n");

    let mut prompt = Prompt::new();

    loop {
        let screen = flow.screen().await;
        eprintln!("── {} ──", screen.step());
        let next = match screen {
            Screen::Login(screen) => run_login(screen, &mut prompt).await?,
            Screen::Ingestion(screen) => run_ingestion(screen, &mut prompt).await?,
            Screen::Testing(screen) => run_assistant(screen, &flow, &mut prompt).await?,
            Screen::Orders(screen) => run_orders(screen, &flow, &mut prompt).await?,
        };
        if let Next::Quit = next {
            break;
        }
    }

    Ok(())
}

async fn run_login(mut screen: LoginScreen, prompt: &mut Prompt) -> anyhow::Result<Next> {
    let Some(email) = prompt.ask("Email: ").await? else {
        return Ok(Next::Quit);
    };
    let Some(password) = prompt.ask("Password: ").await? else {
        return Ok(Next::Quit);
    };
    eprintln!("Signing in...");
    if screen.submit(&email, &password).await.is_none() {
        if let Some(error) = screen.error() {
            eprintln!("✗ {error}");
        }
    }
    Ok(Next::Continue)
}

async fn run_ingestion(mut screen: IngestionScreen, prompt: &mut Prompt) -> anyhow::Result<Next> {
    let Some(url) = prompt.ask("Shopify store URL: ").await? else {
        return Ok(Next::Quit);
    };
    if !screen.can_submit(&url) {
        eprintln!("That does not look like a Shopify store URL (e.g. your-store.myshopify.com).");
        return Ok(Next::Continue);
    }
    eprintln!("Ingesting your catalog...");
    match screen.submit(&url).await {
        Some(_) => {
            if let Some(result) = screen.last_result() {
                eprintln!("✓ {} products imported ({})", result.products, result.status);
            }
        }
        None => {
            if let Some(error) = screen.error() {
                eprintln!("✗ {error}");
            }
        }
    }
    Ok(Next::Continue)
}

/// The argument of a `/token <bot-token>` command, trimmed. `None` when
/// `line` is not that command.
fn token_argument(line: &str) -> Option<&str> {
    line.strip_prefix("/token")
        .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
        .map(str::trim)
}

async fn run_assistant(
    mut screen: AssistantScreen,
    flow: &OnboardingFlow,
    prompt: &mut Prompt,
) -> anyhow::Result<Next> {
    eprintln!("Chat with your sales assistant. Try:");
    for suggestion in screen.suggestions() {
        eprintln!("  • {suggestion}");
    }
    eprintln!("Use /token <bot-token> once your Telegram bot is live.");

    loop {
        let Some(line) = prompt.ask("> ").await? else {
            return Ok(Next::Quit);
        };
        if line == "/logout" {
            flow.logout().await;
            return Ok(Next::Continue);
        }
        if let Some(token) = token_argument(&line) {
            if token.is_empty() {
                eprintln!("Usage: /token <bot-token>");
                continue;
            }
            flow.complete_channel_setup(token).await;
            return Ok(Next::Continue);
        }
        if let Some(reply) = screen.send(&line).await {
            println!("\n{}\n", reply.content);
        }
    }
}

async fn run_orders(
    mut screen: OrdersScreen,
    flow: &OnboardingFlow,
    prompt: &mut Prompt,
) -> anyhow::Result<Next> {
    screen.refresh().await;
    loop {
        if let Some(error) = screen.error() {
            eprintln!("✗ {error}");
        }
        let count = screen.count();
        println!("{count} {} total", if count == 1 { "order" } else { "orders" });
        for order in screen.orders() {
            println!(
                "  {}  {}  {} {}  {}  [{}]",
                order.payment_id,
                display_date(order),
                order.amount,
                order.currency.as_deref().unwrap_or(""),
                order.email,
                order.status,
            );
        }

        let Some(line) = prompt.ask("done <payment_id> | refresh | /logout: ").await? else {
            return Ok(Next::Quit);
        };
        match line.split_once(' ') {
            Some(("done", payment_id)) => {
                let payment_id = payment_id.trim();
                if screen.can_mark_completed(payment_id) {
                    match screen.mark_completed(payment_id).await {
                        Ok(()) if screen.error().is_none() => {
                            eprintln!("✓ {payment_id} marked completed");
                        }
                        Ok(()) => {}
                        Err(e) => eprintln!("✗ Could not complete {payment_id}: {e}"),
                    }
                } else {
                    eprintln!("Nothing to complete for {payment_id}");
                }
            }
            _ if line == "refresh" => screen.refresh().await,
            _ if line == "/logout" => {
                flow.logout().await;
                return Ok(Next::Continue);
            }
            _ => eprintln!("Unknown command: {line}"),
        }
    }
}
