use addressbook_application::AddressBook;
use addressbook_application::config::AddressBookConfig;
use addressbook_application::contact::{
    ChangeContactName, CreateContact, ListClaimedNames, ListContacts, ListStoredEvents,
    RemoveContact,
};
use addressbook_application::context::AppContext;
use addressbook_domain::domain_event::EventContext;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// 先加载 `.env`（若存在），再读取环境变量
fn load_config() -> anyhow::Result<AddressBookConfig> {
    dotenvy::dotenv().ok();
    Ok(AddressBookConfig::from_env()?)
}

fn context(correlation_id: &str) -> AppContext {
    AppContext {
        biz: EventContext::builder()
            .maybe_correlation_id(Some(correlation_id.to_string()))
            .maybe_actor_type(Some("demo".to_string()))
            .build(),
    }
}

async fn print_state(book: &AddressBook, ctx: &AppContext) -> anyhow::Result<()> {
    let contacts = book.query(ctx, ListContacts).await?;
    let names = book.query(ctx, ListClaimedNames).await?;
    println!("contacts: {}", serde_json::to_string(&contacts)?);
    println!("claimed:  {}", serde_json::to_string(&names)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_tracing(&config.log_filter);

    let book = AddressBook::build(&config)?;

    let ctx = context("demo-create");
    book.execute(
        &ctx,
        CreateContact {
            contact_id: "1".into(),
            name: "Bob".into(),
        },
    )
    .await?;
    book.execute(
        &ctx,
        CreateContact {
            contact_id: "2".into(),
            name: "Alice".into(),
        },
    )
    .await?;
    print_state(&book, &ctx).await?;

    let ctx = context("demo-rename");
    book.execute(
        &ctx,
        ChangeContactName {
            contact_id: "1".into(),
            new_name: "Bobby".into(),
        },
    )
    .await?;

    if let Err(err) = book
        .execute(
            &ctx,
            ChangeContactName {
                contact_id: "2".into(),
                new_name: "Bobby".into(),
            },
        )
        .await
    {
        println!("rename rejected: {err}");
    }
    print_state(&book, &ctx).await?;

    let ctx = context("demo-remove");
    book.execute(
        &ctx,
        RemoveContact {
            contact_id: "2".into(),
        },
    )
    .await?;
    print_state(&book, &ctx).await?;

    for event in book.query(&ctx, ListStoredEvents).await? {
        println!(
            "#{:<3} {:<26} {:<3} v{} {}",
            event.sequence_number.unwrap_or_default(),
            event.event_type,
            event.aggregate_id,
            event.aggregate_version,
            event.payload
        );
    }

    Ok(())
}
