//! Text queries over the search index.
//!
//! Three query shapes, chosen by the raw text:
//!
//! - `a + b + c`: every group must occur in some candidate field
//! - `&a b c`: all terms must occur inside the same field; the `&` must be
//!   the very first character
//! - `a b c`: any term in any candidate field
//!
//! Matching is substring containment on normalized tokens.

use thiserror::Error;
use tracing::debug;

use crate::search::index::SearchIndex;
use crate::search::normalize::normalize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query has no search terms")]
    Empty,
    #[error("query mixes '&' (all terms in one field) with '+' groups")]
    MixedModes,
}

/// Which field positions a query may look at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope<'a> {
    All,
    Only(&'a [usize]),
}

impl<'a> FieldScope<'a> {
    /// `All` for an empty position list
    pub fn from_positions(positions: &'a [usize]) -> Self {
        if positions.is_empty() {
            FieldScope::All
        } else {
            FieldScope::Only(positions)
        }
    }

    fn is_restricted(&self) -> bool {
        matches!(self, FieldScope::Only(_))
    }

    fn candidates<'t>(&self, tokens: &'t [String]) -> Box<dyn Iterator<Item = &'t String> + 't>
    where
        'a: 't,
    {
        match *self {
            FieldScope::All => Box::new(tokens.iter()),
            FieldScope::Only(positions) => {
                Box::new(positions.iter().filter_map(move |&p| tokens.get(p)))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Every group is a substring of at least one candidate field
    AllGroups(Vec<String>),
    /// All terms inside one field; every restricted field when restricted
    AllTermsInField(Vec<String>),
    /// Any term in any candidate field
    AnyTerm(Vec<String>),
}

impl Query {
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        let all_in_field = input.starts_with('&');

        let query = if input.contains('+') {
            if all_in_field {
                return Err(QueryError::MixedModes);
            }
            let groups: Vec<String> = input
                .split('+')
                .map(|segment| normalize(segment.trim()))
                .filter(|group| !group.is_empty())
                .collect();
            Query::AllGroups(groups)
        } else if all_in_field {
            Query::AllTermsInField(split_terms(&input[1..]))
        } else {
            Query::AnyTerm(split_terms(input))
        };

        if query.terms().is_empty() {
            return Err(QueryError::Empty);
        }

        debug!(target: "query", "Parsed {:?}", query);
        Ok(query)
    }

    /// The normalized groups or terms
    pub fn terms(&self) -> &[String] {
        match self {
            Query::AllGroups(terms) | Query::AllTermsInField(terms) | Query::AnyTerm(terms) => {
                terms
            }
        }
    }

    /// Evaluate against one normalized index row
    pub fn matches(&self, tokens: &[String], scope: &FieldScope) -> bool {
        match self {
            Query::AllGroups(groups) => groups
                .iter()
                .all(|group| scope.candidates(tokens).any(|t| t.contains(group.as_str()))),
            Query::AllTermsInField(terms) => {
                let contains_all = |token: &String| terms.iter().all(|t| token.contains(t.as_str()));
                if scope.is_restricted() {
                    scope.candidates(tokens).all(contains_all)
                } else {
                    scope.candidates(tokens).any(contains_all)
                }
            }
            Query::AnyTerm(terms) => scope
                .candidates(tokens)
                .any(|token| terms.iter().any(|t| token.contains(t.as_str()))),
        }
    }

    /// Source indices of matching rows, in source order
    pub fn filter(&self, index: &SearchIndex, scope: &FieldScope) -> Vec<usize> {
        index
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, tokens)| self.matches(tokens, scope))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Split `"name, city"` into field names
pub fn split_field_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_terms(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| normalize(v)).collect()
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!(
            Query::parse("Juan + Madrid").unwrap(),
            Query::AllGroups(vec!["juan".into(), "madrid".into()])
        );
        assert_eq!(
            Query::parse("&José  Pérez").unwrap(),
            Query::AllTermsInField(vec!["jose".into(), "perez".into()])
        );
        assert_eq!(
            Query::parse("juan pedro").unwrap(),
            Query::AnyTerm(vec!["juan".into(), "pedro".into()])
        );
    }

    #[test]
    fn test_groups_keep_inner_spaces() {
        assert_eq!(
            Query::parse("san jose+costa").unwrap(),
            Query::AllGroups(vec!["san jose".into(), "costa".into()])
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Query::parse(""), Err(QueryError::Empty));
        assert_eq!(Query::parse("   "), Err(QueryError::Empty));
        assert_eq!(Query::parse("+ +"), Err(QueryError::Empty));
        assert_eq!(Query::parse("&"), Err(QueryError::Empty));
        assert_eq!(Query::parse("&a+b"), Err(QueryError::MixedModes));
    }

    #[test]
    fn test_all_groups_across_fields() {
        let q = Query::parse("Juan+Madrid").unwrap();
        assert!(q.matches(&tokens(&["Juan", "Madrid"]), &FieldScope::All));
        assert!(!q.matches(&tokens(&["Juan", "Sevilla"]), &FieldScope::All));
        assert!(!q.matches(&tokens(&["Juan", "Madrid"]), &FieldScope::Only(&[0])));
    }

    #[test]
    fn test_all_terms_in_one_field() {
        let q = Query::parse("&juan madrid").unwrap();
        assert!(q.matches(&tokens(&["Juan de Madrid", "x"]), &FieldScope::All));
        assert!(!q.matches(&tokens(&["Juan", "Madrid"]), &FieldScope::All));

        // Restricted: every listed field needs every term
        let row = tokens(&["Juan Madrid", "Madrid Juan", "Pedro"]);
        assert!(q.matches(&row, &FieldScope::Only(&[0, 1])));
        assert!(!q.matches(&row, &FieldScope::Only(&[0, 2])));
    }

    #[test]
    fn test_any_term_respects_scope() {
        let q = Query::parse("pedro").unwrap();
        let row = tokens(&["Juan", "Pedro"]);
        assert!(q.matches(&row, &FieldScope::All));
        assert!(!q.matches(&row, &FieldScope::Only(&[0])));
        assert!(q.matches(&row, &FieldScope::from_positions(&[])));
    }

    #[test]
    fn test_date_query_matches_other_format() {
        let q = Query::parse("2020-12-31").unwrap();
        assert!(q.matches(&tokens(&["31/12/2020"]), &FieldScope::All));
    }

    #[test]
    fn test_split_field_list() {
        assert_eq!(split_field_list(" name, city ,,"), vec!["name", "city"]);
        assert!(split_field_list("").is_empty());
    }
}
