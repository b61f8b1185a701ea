use adminview::nav::{NavEntry, NavRules, Navigator, VisibilityFlag};
use adminview::session::{CurrentUser, StaticSession};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let navigator = Navigator::new(
        vec![
            NavEntry::new("dashboard")
                .with_flag(VisibilityFlag::DashboardEntry)
                .with_target("/dashboard.html"),
            NavEntry::new("orders")
                .with_label("Orders")
                .with_capability("orders.view")
                .with_target("/orders.html"),
            NavEntry::new("autopay")
                .with_label("Autopay")
                .with_capability("autopay.view")
                .with_target("/autopay.html"),
        ],
        NavRules::new(["collector"]),
    )?;

    let session = StaticSession::authenticated(
        CurrentUser {
            name: "Kim".to_string(),
            role: "collector".to_string(),
            is_super_admin: false,
            capabilities: ["autopay.view".to_string()].into_iter().collect(),
        },
        "/login.html",
    );

    for entry in navigator.visible_entries(&session) {
        println!("{:<12} {}", entry.display_label(), navigator.resolve_id(&entry.id)?);
    }
    println!("landing: {:?}", navigator.landing_target(&session));

    Ok(())
}
