use proptest::collection::vec;
use proptest::prelude::*;
use squad_page::{FilterState, Page, PageConfig, RoleFilter};

const ROLES: [&str; 4] = ["GOALKEEPER", "DEFENDER", "MIDFIELDER", "ATTACKER"];

fn fixture() -> String {
    let mut html = String::from(r#"<nav id="role-filter">"#);
    for (idx, role) in ROLES.iter().enumerate() {
        html.push_str(&format!(
            r#"<button class="pill" id="pill-{idx}" data-role="{role}">{role}</button>"#
        ));
    }
    html.push_str("</nav>");
    for (idx, role) in ROLES.iter().enumerate() {
        html.push_str(&format!(
            r#"<section class="role-group" id="group-{idx}" data-role="{role}"><div class="cards"></div></section>"#
        ));
    }
    html
}

proptest! {
    /// Any sequence of pill clicks keeps the filter's two invariants: at
    /// most one pill is active, and the hidden groups are exactly the
    /// non-matching ones.
    #[test]
    fn click_sequences_preserve_filter_invariants(clicks in vec(0..ROLES.len(), 1..16)) {
        let mut page = Page::from_html(&fixture()).expect("fixture should parse");
        let mut filter = RoleFilter::new(PageConfig::default());
        let mut model: Option<usize> = None;

        for &click in &clicks {
            filter
                .toggle(&mut page, &format!("#pill-{click}"))
                .expect("toggle should succeed");
            model = if model == Some(click) { None } else { Some(click) };

            match model {
                None => prop_assert_eq!(filter.state(), &FilterState::Unfiltered),
                Some(active) => prop_assert_eq!(
                    filter.state(),
                    &FilterState::Filtered(ROLES[active].to_string())
                ),
            }

            let mut active_pills = 0;
            for idx in 0..ROLES.len() {
                let expect_active = model == Some(idx);
                let pill = format!("#pill-{idx}");
                let pressed = page
                    .attr(&pill, "aria-pressed")
                    .expect("pill should exist");
                prop_assert_eq!(
                    pressed.as_deref(),
                    Some(if expect_active { "true" } else { "false" })
                );
                if page.has_class(&pill, "border-red-700").expect("pill should exist") {
                    active_pills += 1;
                }

                let expect_hidden = model.is_some() && !expect_active;
                let hidden = page
                    .is_hidden(&format!("#group-{idx}"))
                    .expect("group should exist");
                prop_assert_eq!(hidden, expect_hidden);
            }
            prop_assert!(active_pills <= 1);
            prop_assert_eq!(active_pills, usize::from(model.is_some()));
        }
    }
}
