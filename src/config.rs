use serde::{Deserialize, Serialize};

/// Conventions the page markup and backend share: element addresses, state
/// classes, header and cookie names. The defaults are the roster page's own
/// values; hosts with different templates can load their own set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub modal_selector: String,
    pub modal_body_selector: String,
    pub hidden_class: String,
    /// Attribute marking click targets that dismiss the modal.
    pub close_attr: String,

    /// Roster cards are addressed as `#<card_id_prefix><entity id>`.
    pub card_id_prefix: String,
    pub role_attr: String,
    pub group_selector: String,
    /// Card list inside a role group, the insertion point for new cards.
    pub card_list_selector: String,

    pub filter_bar_selector: String,
    pub filter_pill_selector: String,
    pub active_pill_classes: Vec<String>,
    pub inactive_pill_classes: Vec<String>,

    /// Trigger attributes: the form-fragment URL and the submission URL.
    pub form_url_attr: String,
    pub url_attr: String,

    pub csrf_cookie: String,
    pub csrf_header: String,
    pub background_header: String,
    pub background_value: String,

    pub delete_prompt: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            modal_selector: "#modal".into(),
            modal_body_selector: "#modal-body".into(),
            hidden_class: "hidden".into(),
            close_attr: "data-close".into(),

            card_id_prefix: "player-card-".into(),
            role_attr: "data-role".into(),
            group_selector: ".role-group".into(),
            card_list_selector: ".cards".into(),

            filter_bar_selector: "#role-filter".into(),
            filter_pill_selector: "#role-filter .pill".into(),
            active_pill_classes: vec![
                "border-red-700".into(),
                "font-semibold".into(),
                "text-gray-900".into(),
            ],
            inactive_pill_classes: vec![
                "border-transparent".into(),
                "font-normal".into(),
                "text-gray-500".into(),
                "hover:border-gray-300".into(),
                "hover:text-gray-700".into(),
            ],

            form_url_attr: "data-form-url".into(),
            url_attr: "data-url".into(),

            csrf_cookie: "csrftoken".into(),
            csrf_header: "X-CSRFToken".into(),
            background_header: "X-Requested-With".into(),
            background_value: "XMLHttpRequest".into(),

            delete_prompt: "Remove this player?".into(),
        }
    }
}

impl PageConfig {
    pub fn card_selector(&self, entity_id: i64) -> String {
        format!("#{}{}", self.card_id_prefix, entity_id)
    }

    pub fn card_element_id(&self, entity_id: i64) -> String {
        format!("{}{}", self.card_id_prefix, entity_id)
    }

    /// Selector for a role group's card list, e.g.
    /// `.role-group[data-role="GOALKEEPER"] .cards`.
    pub fn card_list_in_group(&self, role: &str) -> String {
        format!(
            "{}[{}=\"{}\"] {}",
            self.group_selector, self.role_attr, role, self.card_list_selector
        )
    }

    pub fn group_with_role(&self, role: &str) -> String {
        format!("{}[{}=\"{}\"]", self.group_selector, self.role_attr, role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_page_markup_conventions() {
        let config = PageConfig::default();
        assert_eq!(config.card_selector(9), "#player-card-9");
        assert_eq!(
            config.card_list_in_group("GOALKEEPER"),
            r#".role-group[data-role="GOALKEEPER"] .cards"#
        );
        assert_eq!(config.csrf_cookie, "csrftoken");
    }

    #[test]
    fn partial_overrides_round_trip_through_serde() {
        let config: PageConfig =
            serde_json::from_str(r#"{"card_id_prefix": "member-", "hidden_class": "d-none"}"#)
                .expect("partial config should deserialize");
        assert_eq!(config.card_selector(3), "#member-3");
        assert_eq!(config.hidden_class, "d-none");
        assert_eq!(config.modal_selector, "#modal");

        let encoded = serde_json::to_string(&config).expect("config should serialize");
        assert!(encoded.contains("member-"));
    }
}
