use adminview::runner::{Options, ResourceSpec, Runner};
use adminview::session::{CurrentUser, StaticSession};
use std::error::Error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(Options {
        base_url: Some("http://localhost:3000/api/".to_string()),
        token: std::env::var("ADMINVIEW_TOKEN").ok(),
        resources: vec![
            ResourceSpec::endpoint("users", "admin/users"),
            ResourceSpec::endpoint("autopay", "admin/autopay")
                .id_field("user_id")
                .list_key("users"),
        ],
        ..Options::default()
    })?;

    let session = StaticSession::authenticated(
        CurrentUser {
            name: "Operator".to_string(),
            role: "manager".to_string(),
            ..CurrentUser::default()
        },
        "/login.html",
    );

    let report = runner.load(&session).await?;
    for (resource, count) in report.loaded.iter() {
        println!("{resource}: {count} records");
    }
    for failure in report.failures.iter() {
        println!("{}: {}", failure.resource, failure.error);
    }

    match runner.show("users", "1") {
        Ok(user) => println!("{} {}", user.id, user.display_name()),
        Err(e) => println!("{e}"),
    }

    Ok(())
}
