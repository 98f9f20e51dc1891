use std::io;

use cartsim_core::catalog::{CartRandomness, CatalogSource};
use cartsim_core::config::{AppConfig, LoadOptions};
use cartsim_core::domain::customer::CustomerData;
use cartsim_core::quoting::QuoteService;
use cartsim_core::storefront::Storefront;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::commands::{live_storefront, runtime, CommandResult};
use crate::init_logging;
use crate::render::{page_title, render_notices, render_summary};

pub const HELP: &str = "commands:
  generate                                    draw a random cart (home page)
  checkout                                    review the cart
  home                                        back to the start page
  shipping                                    open the shipping form
  customer <name>|<street>|<commune>|<phone>  save shipping details
  quote [<name>|<street>|<commune>|<phone>]   request a shipping quote
  clear                                       empty the cart
  show                                        print the cart
  help                                        print this list
  quit                                        end the session";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShopCommand {
    Generate,
    Checkout,
    Home,
    Shipping,
    Customer(CustomerData),
    Quote(Option<CustomerData>),
    Clear,
    Show,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<ShopCommand, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "generate" | "g" => ShopCommand::Generate,
        "checkout" | "c" => ShopCommand::Checkout,
        "home" => ShopCommand::Home,
        "shipping" | "s" => ShopCommand::Shipping,
        "customer" => ShopCommand::Customer(parse_customer(rest)?),
        "quote" | "q" if rest.is_empty() => ShopCommand::Quote(None),
        "quote" | "q" => ShopCommand::Quote(Some(parse_customer(rest)?)),
        "clear" => ShopCommand::Clear,
        "show" => ShopCommand::Show,
        "help" | "?" => ShopCommand::Help,
        "quit" | "exit" => ShopCommand::Quit,
        "" => return Err("type `help` to list commands".to_string()),
        other => return Err(format!("unknown command `{other}`; type `help` to list commands")),
    };
    Ok(command)
}

fn parse_customer(raw: &str) -> Result<CustomerData, String> {
    let fields: Vec<&str> = raw.split('|').collect();
    match fields.as_slice() {
        [name, street, commune, phone] => Ok(CustomerData::new(*name, *street, *commune, *phone)),
        _ => Err("expected <name>|<street>|<commune>|<phone>".to_string()),
    }
}

/// Drives one storefront from line-oriented input until `quit` or end of input.
/// Returns how many commands were executed.
pub async fn run_session<C, Q, R, I, O>(
    storefront: &mut Storefront<C, Q, R>,
    input: I,
    output: &mut O,
) -> io::Result<u32>
where
    C: CatalogSource,
    Q: QuoteService,
    R: CartRandomness,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut executed = 0;

    loop {
        output.write_all(format!("{}> ", page_title(storefront.page())).as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                write_block(output, &message).await?;
                continue;
            }
        };
        if command == ShopCommand::Quit {
            break;
        }

        executed += 1;
        let report = execute(storefront, command).await;
        write_block(output, &report).await?;
    }

    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(executed)
}

async fn execute<C, Q, R>(storefront: &mut Storefront<C, Q, R>, command: ShopCommand) -> String
where
    C: CatalogSource,
    Q: QuoteService,
    R: CartRandomness,
{
    let show_cart = matches!(
        command,
        ShopCommand::Generate | ShopCommand::Checkout | ShopCommand::Quote(_) | ShopCommand::Show
    );

    match command {
        ShopCommand::Generate => {
            storefront.generate_cart().await;
        }
        ShopCommand::Checkout => {
            storefront.open_checkout();
        }
        ShopCommand::Home => {
            storefront.back_to_home();
        }
        ShopCommand::Shipping => {
            storefront.open_shipping();
        }
        ShopCommand::Customer(customer) => {
            storefront.save_customer_data(customer);
        }
        ShopCommand::Quote(customer) => {
            let customer = customer
                .or_else(|| storefront.state().customer.clone())
                .unwrap_or_default();
            storefront.request_quote(customer).await;
        }
        ShopCommand::Clear => {
            storefront.clear_cart();
        }
        ShopCommand::Help => return HELP.to_string(),
        ShopCommand::Show | ShopCommand::Quit => {}
    }

    let mut sections = Vec::new();
    let notices = render_notices(&storefront.take_notices());
    if !notices.is_empty() {
        sections.push(notices);
    }
    if show_cart && !storefront.state().is_cart_empty() {
        sections.push(render_summary(&storefront.checkout_summary()));
    }
    sections.push(format!("page: {}", page_title(storefront.page())));
    sections.join("\n")
}

async fn write_block<O: AsyncWrite + Unpin>(output: &mut O, block: &str) -> io::Result<()> {
    output.write_all(block.as_bytes()).await?;
    output.write_all(b"\n").await
}

pub fn run(seed: Option<u64>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "shop",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };
    init_logging(&config);

    let mut storefront = match live_storefront(&config, seed) {
        Ok(storefront) => storefront,
        Err(error) => return CommandResult::failure("shop", "http_client", error.to_string(), 3),
    };
    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("shop", "runtime", error, 4),
    };

    let result = runtime.block_on(async {
        let mut stdout = tokio::io::stdout();
        run_session(&mut storefront, BufReader::new(tokio::io::stdin()), &mut stdout).await
    });

    match result {
        Ok(executed) => {
            CommandResult::success("shop", format!("session ended after {executed} commands"))
        }
        Err(error) => CommandResult::failure("shop", "io", error.to_string(), 5),
    }
}
