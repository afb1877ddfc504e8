use clap::Parser;
use feedline::client::*;
use feedline::domain_model::UserId;
use feedline::logger::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "feedline_client", about = "Interactive client for the feedline API")]
struct ClientCli {
    #[arg(long, default_value = "http://127.0.0.1:4000")]
    base_url: String,

    /// Where the access token survives restarts.
    #[arg(long, default_value = ".feedline/session.json")]
    session_file: String,

    #[arg(long, default_value_t = 10)]
    refresh_timeout_secs: u64,

    #[arg(long, default_value = "warn")]
    log_filter: String,
}

struct PromptRedirect;

impl LoginRedirect for PromptRedirect {
    fn redirect_to_login(&self) {
        println!("session expired, please `login` again");
    }
}

const HELP: &str = "\
commands:
  register <username> <password>
  login <username> <password>
  logout
  post <text...>
  feed [page] [limit]
  follow <user-id>
  unfollow <user-id>
  following
  users
  status
  quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = ClientCli::parse();
    let _logger = Logger::with_filter(&cli.log_filter);

    let config = ClientConfig {
        base_url: cli.base_url.clone(),
        refresh_timeout: Duration::from_secs(cli.refresh_timeout_secs),
    };
    let client = FeedClient::connect(
        &config,
        Arc::new(FileSessionPersistence::new(&cli.session_file)),
        Arc::new(PromptRedirect),
    )?;

    client.session().rehydrate().await;
    client.session().wait_hydrated().await;
    print_status(&client);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };
        if command == "quit" || command == "exit" {
            break;
        }
        if let Err(e) = run_command(&client, command, args).await {
            println!("error: {e}");
        }
    }
    Ok(())
}

fn print_status(client: &FeedClient) {
    match auth_gate(&client.session().snapshot()) {
        Gate::Pending => println!("restoring session..."),
        Gate::Authenticated => println!("logged in"),
        Gate::Unauthenticated => println!("not logged in"),
    }
}

async fn run_command(client: &FeedClient, command: &str, args: &[&str]) -> anyhow::Result<()> {
    let needs_session = !matches!(command, "register" | "login" | "help" | "status");
    if needs_session && auth_gate(&client.session().snapshot()) != Gate::Authenticated {
        println!("not logged in");
        return Ok(());
    }

    match (command, args) {
        ("help", _) => println!("{HELP}"),
        ("status", _) => print_status(client),
        ("register", [username, password]) => {
            let user = client.register(username, password).await?;
            println!("registered {} (id {})", user.username, user.id);
        }
        ("login", [username, password]) => {
            client.login(username, password).await?;
            println!("logged in as {username}");
        }
        ("logout", []) => {
            client.logout().await;
            println!("logged out");
        }
        ("post", words) if !words.is_empty() => {
            let post = client.create_post(&words.join(" ")).await?;
            println!("posted #{}", post.id.0);
        }
        ("feed", rest) => {
            let page = rest.first().map(|p| p.parse::<u32>()).transpose()?.unwrap_or(1);
            let limit = rest.get(1).map(|l| l.parse::<u32>()).transpose()?.unwrap_or(10);
            let feed = client.feed(page, limit).await?;
            println!("page {}", feed.page);
            for post in feed.posts {
                println!("  [{}] user {}: {}", post.created_at, post.user_id, post.content);
            }
        }
        ("follow", [id]) => println!("{}", client.follow(id.parse::<UserId>()?).await?),
        ("unfollow", [id]) => println!("{}", client.unfollow(id.parse::<UserId>()?).await?),
        ("following", []) => {
            for id in client.following().await? {
                println!("  {id}");
            }
        }
        ("users", []) => {
            for user in client.users().await? {
                println!("  {} {}", user.id, user.username);
            }
        }
        _ => println!("unrecognized command, try `help`"),
    }
    Ok(())
}
