use crate::dom::{Dom, NodeId};
use crate::{Error, Result};

/// One compound selector: `tag#id.class[attr=value]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<AttrCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    StartsWith { key: String, value: String },
}

/// Parses a selector list into groups of descendant-combined steps.
///
/// Supported: tag, `*`, `#id`, `.class`, `[attr]`, `[attr=v]`, `[attr^=v]`
/// (values optionally quoted), whitespace descendant combinators, and
/// comma-separated groups. Child/sibling combinators are rejected.
pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorStep>>> {
    let groups = split_groups(selector)?;
    let mut parsed = Vec::with_capacity(groups.len());
    for group in groups {
        parsed.push(parse_chain(&group)?);
    }
    Ok(parsed)
}

/// True when the element matches any group: its rightmost step matches the
/// node and each earlier step matches some ancestor, in order.
pub(crate) fn matches_any(dom: &Dom, node: NodeId, groups: &[Vec<SelectorStep>]) -> bool {
    groups.iter().any(|chain| matches_chain(dom, node, chain))
}

fn matches_chain(dom: &Dom, node: NodeId, chain: &[SelectorStep]) -> bool {
    let Some((last, ancestors)) = chain.split_last() else {
        return false;
    };
    if !matches_step(dom, node, last) {
        return false;
    }

    let mut cursor = dom.parent(node);
    for step in ancestors.iter().rev() {
        loop {
            let Some(candidate) = cursor else {
                return false;
            };
            cursor = dom.parent(candidate);
            if matches_step(dom, candidate, step) {
                break;
            }
        }
    }
    true
}

fn matches_step(dom: &Dom, node: NodeId, step: &SelectorStep) -> bool {
    let Some(element) = dom.element(node) else {
        return false;
    };

    if let Some(tag) = &step.tag {
        if !element.tag_name.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id) = &step.id {
        if element.attr("id") != Some(id.as_str()) {
            return false;
        }
    }
    for class in &step.classes {
        if !dom.has_class(node, class) {
            return false;
        }
    }
    for condition in &step.attrs {
        let matched = match condition {
            AttrCondition::Exists { key } => element.attr(key).is_some(),
            AttrCondition::Eq { key, value } => element.attr(key) == Some(value.as_str()),
            AttrCondition::StartsWith { key, value } => {
                element.attr(key).is_some_and(|attr| attr.starts_with(value))
            }
        };
        if !matched {
            return false;
        }
    }
    true
}

fn split_groups(selector: &str) -> Result<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in selector.chars() {
        match ch {
            '\'' | '"' => {
                match quote {
                    Some(open) if open == ch => quote = None,
                    None => quote = Some(ch),
                    Some(_) => {}
                }
                current.push(ch);
            }
            '[' if quote.is_none() => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' if quote.is_none() => {
                if bracket_depth == 0 {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            ',' if quote.is_none() && bracket_depth == 0 => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                groups.push(trimmed.to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 || quote.is_some() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    let trimmed = current.trim();
    if trimmed.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

fn parse_chain(group: &str) -> Result<Vec<SelectorStep>> {
    let mut steps = Vec::new();
    for token in tokenize(group)? {
        if matches!(token.as_str(), ">" | "+" | "~") {
            return Err(Error::UnsupportedSelector(group.into()));
        }
        steps.push(parse_step(&token)?);
    }
    if steps.is_empty() {
        return Err(Error::UnsupportedSelector(group.into()));
    }
    Ok(steps)
}

fn tokenize(group: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in group.chars() {
        match ch {
            '\'' | '"' => {
                match quote {
                    Some(open) if open == ch => quote = None,
                    None => quote = Some(ch),
                    Some(_) => {}
                }
                current.push(ch);
            }
            '[' if quote.is_none() => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' if quote.is_none() => {
                if bracket_depth == 0 {
                    return Err(Error::UnsupportedSelector(group.into()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            '>' | '+' | '~' if quote.is_none() && bracket_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
                tokens.push(ch.to_string());
            }
            ch if ch.is_ascii_whitespace() && quote.is_none() && bracket_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }
    Ok(tokens)
}

fn parse_step(part: &str) -> Result<SelectorStep> {
    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = SelectorStep::default();

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if step.universal || step.tag.is_some() {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                step.universal = true;
                i += 1;
            }
            b'#' => {
                i += 1;
                let Some((id, next)) = parse_ident(part, i) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                if step.id.replace(id).is_some() {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                i = next;
            }
            b'.' => {
                i += 1;
                let Some((class_name, next)) = parse_ident(part, i) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                step.classes.push(class_name);
                i = next;
            }
            b'[' => {
                let (condition, next) = parse_attr_condition(part, i)?;
                step.attrs.push(condition);
                i = next;
            }
            _ => {
                if step.tag.is_some() || step.id.is_some() || !step.classes.is_empty() || step.universal
                {
                    return Err(Error::UnsupportedSelector(part.into()));
                }
                let Some((tag, next)) = parse_ident(part, i) else {
                    return Err(Error::UnsupportedSelector(part.into()));
                };
                step.tag = Some(tag);
                i = next;
            }
        }
    }

    if step.tag.is_none()
        && step.id.is_none()
        && step.classes.is_empty()
        && step.attrs.is_empty()
        && !step.universal
    {
        return Err(Error::UnsupportedSelector(part.into()));
    }
    Ok(step)
}

fn parse_attr_condition(src: &str, open_bracket: usize) -> Result<(AttrCondition, usize)> {
    let bytes = src.as_bytes();
    let mut i = open_bracket + 1;

    skip_ws(bytes, &mut i);
    let key_start = i;
    while i < bytes.len() && is_attr_name_char(bytes[i]) {
        i += 1;
    }
    if key_start == i {
        return Err(Error::UnsupportedSelector(src.into()));
    }
    let key = src
        .get(key_start..i)
        .ok_or_else(|| Error::UnsupportedSelector(src.into()))?
        .to_ascii_lowercase();

    skip_ws(bytes, &mut i);
    match bytes.get(i) {
        Some(b']') => return Ok((AttrCondition::Exists { key }, i + 1)),
        Some(b'=') => {
            i += 1;
            let (value, next) = parse_attr_value(src, i)?;
            i = next;
            skip_ws(bytes, &mut i);
            if bytes.get(i) != Some(&b']') {
                return Err(Error::UnsupportedSelector(src.into()));
            }
            Ok((AttrCondition::Eq { key, value }, i + 1))
        }
        Some(b'^') if bytes.get(i + 1) == Some(&b'=') => {
            i += 2;
            let (value, next) = parse_attr_value(src, i)?;
            i = next;
            skip_ws(bytes, &mut i);
            if bytes.get(i) != Some(&b']') {
                return Err(Error::UnsupportedSelector(src.into()));
            }
            Ok((AttrCondition::StartsWith { key, value }, i + 1))
        }
        _ => Err(Error::UnsupportedSelector(src.into())),
    }
}

fn parse_attr_value(src: &str, start: usize) -> Result<(String, usize)> {
    let bytes = src.as_bytes();
    let mut i = start;
    skip_ws(bytes, &mut i);
    if i >= bytes.len() {
        return Err(Error::UnsupportedSelector(src.into()));
    }

    if bytes[i] == b'"' || bytes[i] == b'\'' {
        let quote = bytes[i];
        i += 1;
        let value_start = i;
        while i < bytes.len() && bytes[i] != quote {
            i += 1;
        }
        if i >= bytes.len() {
            return Err(Error::UnsupportedSelector(src.into()));
        }
        let value = src
            .get(value_start..i)
            .ok_or_else(|| Error::UnsupportedSelector(src.into()))?
            .to_string();
        return Ok((value, i + 1));
    }

    let value_start = i;
    while i < bytes.len() && bytes[i] != b']' && !bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let value = src
        .get(value_start..i)
        .ok_or_else(|| Error::UnsupportedSelector(src.into()))?
        .to_string();
    Ok((value, i))
}

fn parse_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    if start >= bytes.len() || !is_ident_char(bytes[start]) {
        return None;
    }
    let mut end = start + 1;
    while end < bytes.len() && is_ident_char(bytes[end]) {
        end += 1;
    }
    Some((src.get(start..end)?.to_string(), end))
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn is_attr_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b':'
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_fragment;

    #[test]
    fn descendant_chain_with_attr_value_matches() -> crate::Result<()> {
        let dom = parse_fragment(
            r#"<section class="role-group" data-role="GOALKEEPER">
                 <div class="cards"><article id="a">x</article></div>
               </section>
               <section class="role-group" data-role="DEFENDER">
                 <div class="cards"><article id="b">y</article></div>
               </section>"#,
        )?;
        let hits = dom.query_selector_all(r#".role-group[data-role="DEFENDER"] .cards"#)?;
        assert_eq!(hits.len(), 1);
        assert_eq!(dom.first_element_child(hits[0]), dom.by_id("b"));
        Ok(())
    }

    #[test]
    fn prefix_condition_and_groups_match_in_document_order() -> crate::Result<()> {
        let dom = parse_fragment(
            r#"<div id="player-card-1"></div><p id="note"></p><div id="player-card-2"></div>"#,
        )?;
        let hits = dom.query_selector_all(r#"[id^="player-card-"], #note"#)?;
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[1], dom.by_id("note").expect("note exists"));
        Ok(())
    }

    #[test]
    fn unquoted_attr_value_parses() -> crate::Result<()> {
        let dom = parse_fragment(r#"<div data-role="MIDFIELDER" id="m"></div>"#)?;
        assert_eq!(
            dom.query_selector("[data-role=MIDFIELDER]")?,
            dom.by_id("m")
        );
        Ok(())
    }

    #[test]
    fn child_combinator_is_rejected() {
        let err = parse_selector_groups("div > span").expect_err("should fail");
        assert!(matches!(err, Error::UnsupportedSelector(_)));
    }

    #[test]
    fn empty_group_is_rejected() {
        assert!(parse_selector_groups("a, ,b").is_err());
        assert!(parse_selector_groups("").is_err());
    }
}
