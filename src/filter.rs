use crate::config::PageConfig;
use crate::dom::NodeId;
use crate::page::Page;
use crate::Result;

/// The single active role filter, reset on every page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterState {
    Unfiltered,
    Filtered(String),
}

/// Role filter for the card view: marks one pill active at a time and hides
/// every content target whose role attribute does not match.
///
/// Visibility targeting is decided each time the filter is applied: when the
/// page has role-group containers those are shown and hidden as units;
/// otherwise the filter falls back to role-tagged elements outside the
/// filter bar, which covers flat card listings.
#[derive(Debug)]
pub struct RoleFilter {
    config: PageConfig,
    state: FilterState,
}

impl RoleFilter {
    pub fn new(config: PageConfig) -> Self {
        Self {
            config,
            state: FilterState::Unfiltered,
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Handles a click on a filter control. Clicking the active role again
    /// clears the filter; a control without a role attribute is a no-op.
    pub fn toggle(&mut self, page: &mut Page, control: &str) -> Result<FilterState> {
        let node = page.select_one(control)?;
        let role = page
            .dom
            .attr(node, &self.config.role_attr)
            .filter(|role| !role.is_empty());
        let Some(role) = role else {
            return Ok(self.state.clone());
        };

        if self.state == FilterState::Filtered(role.clone()) {
            self.clear(page)?;
        } else {
            self.activate(page, node, &role)?;
        }
        Ok(self.state.clone())
    }

    fn clear(&mut self, page: &mut Page) -> Result<()> {
        for pill in page.dom.query_selector_all(&self.config.filter_pill_selector)? {
            self.set_pill_active(page, pill, false)?;
        }
        for target in self.visibility_targets(page)? {
            page.dom.remove_class(target, &self.config.hidden_class)?;
        }
        log::debug!("role filter cleared");
        self.state = FilterState::Unfiltered;
        Ok(())
    }

    fn activate(&mut self, page: &mut Page, clicked: NodeId, role: &str) -> Result<()> {
        for pill in page.dom.query_selector_all(&self.config.filter_pill_selector)? {
            self.set_pill_active(page, pill, pill == clicked)?;
        }

        let mut first_match = None;
        for target in self.visibility_targets(page)? {
            let matches = page.dom.attr(target, &self.config.role_attr).as_deref() == Some(role);
            page.dom
                .toggle_class(target, &self.config.hidden_class, !matches)?;
            if matches && first_match.is_none() {
                first_match = Some(target);
            }
        }
        if let Some(target) = first_match {
            page.scroll_into_view(target);
        }

        log::debug!("role filter set to {role}");
        self.state = FilterState::Filtered(role.to_string());
        Ok(())
    }

    fn set_pill_active(&self, page: &mut Page, pill: NodeId, active: bool) -> Result<()> {
        let (add, remove) = if active {
            (
                &self.config.active_pill_classes,
                &self.config.inactive_pill_classes,
            )
        } else {
            (
                &self.config.inactive_pill_classes,
                &self.config.active_pill_classes,
            )
        };
        for class in remove {
            page.dom.remove_class(pill, class)?;
        }
        for class in add {
            page.dom.add_class(pill, class)?;
        }
        page.dom
            .set_attr(pill, "aria-pressed", if active { "true" } else { "false" })?;
        Ok(())
    }

    fn visibility_targets(&self, page: &Page) -> Result<Vec<NodeId>> {
        let groups = page.dom.query_selector_all(&self.config.group_selector)?;
        if !groups.is_empty() {
            return Ok(groups);
        }

        let tagged = page
            .dom
            .query_selector_all(&format!("[{}]", self.config.role_attr))?;
        let bar = page.dom.query_selector(&self.config.filter_bar_selector)?;
        Ok(tagged
            .into_iter()
            .filter(|node| match bar {
                Some(bar) => *node != bar && !page.dom.is_descendant_of(*node, bar),
                None => true,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_without_role_leaves_state_untouched() -> Result<()> {
        let mut page = Page::from_html(
            r#"<nav id="role-filter"><button class="pill" id="blank">All</button></nav>
               <section class="role-group" data-role="DEFENDER"><div class="cards"></div></section>"#,
        )?;
        let mut filter = RoleFilter::new(PageConfig::default());
        let state = filter.toggle(&mut page, "#blank")?;
        assert_eq!(state, FilterState::Unfiltered);
        assert!(!page.is_hidden(".role-group")?);
        Ok(())
    }

    #[test]
    fn targeting_prefers_groups_over_tagged_cards() -> Result<()> {
        let mut page = Page::from_html(
            r#"<nav id="role-filter">
                 <button class="pill" id="pill-df" data-role="DEFENDER">DF</button>
               </nav>
               <section class="role-group" data-role="DEFENDER">
                 <div class="cards"><article id="player-card-1" data-role="DEFENDER">A</article></div>
               </section>
               <section class="role-group" data-role="ATTACKER">
                 <div class="cards"><article id="player-card-2" data-role="ATTACKER">B</article></div>
               </section>"#,
        )?;
        let mut filter = RoleFilter::new(PageConfig::default());
        filter.toggle(&mut page, "#pill-df")?;

        // Groups are the unit of hiding; the cards inside keep their classes.
        assert!(page.is_hidden(r#".role-group[data-role="ATTACKER"]"#)?);
        assert!(!page.is_hidden(r#".role-group[data-role="DEFENDER"]"#)?);
        assert!(!page.is_hidden("#player-card-2")?);
        Ok(())
    }
}
