//! Option combination generator.
//!
//! Produces the Cartesian product of a root's option values. Ordering treats the
//! options as nested loops: the first option is the outermost loop and the last
//! option varies fastest. For `Size: [small, medium]` x `Color: [red, blue]` that is
//! `small/red, small/blue, medium/red, medium/blue`.
//!
//! That order decides which SKU each variant receives, so it must never change
//! for identical input.
//!
//! The generator yields nothing for an empty option list. Callers handle the
//! "no options" family (one variant, SKU = prefix) themselves; see
//! [`crate::variant::materialize_base_variant`].

use storefront_core::ProductOptionValueId;

use crate::option::{ProductOption, ProductOptionValue};
use crate::sku::SKU_SEPARATOR;

/// Separator between `"<Option>: <value>"` parts of a summary.
pub const SUMMARY_SEPARATOR: &str = ", ";

/// One value picked from one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    pub option_name: &'a str,
    pub value: &'a ProductOptionValue,
}

impl Selection<'_> {
    /// `"<Option>: <value>"`.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.option_name, self.value.value)
    }
}

/// One tuple of the Cartesian product, one selection per option in option order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination<'a> {
    selections: Vec<Selection<'a>>,
}

impl<'a> Combination<'a> {
    pub fn selections(&self) -> &[Selection<'a>] {
        &self.selections
    }

    /// Selected values lower-cased and joined with `_`, in option order.
    pub fn sku_suffix(&self) -> String {
        self.selections
            .iter()
            .map(|s| s.value.value.to_lowercase())
            .collect::<Vec<_>>()
            .join(SKU_SEPARATOR)
    }

    /// `"Size: small, Color: red"`.
    pub fn summary(&self) -> String {
        self.selections
            .iter()
            .map(Selection::summary)
            .collect::<Vec<_>>()
            .join(SUMMARY_SEPARATOR)
    }

    /// Identifiers of the contributing values (bridge linkage).
    pub fn option_value_ids(&self) -> Vec<ProductOptionValueId> {
        self.selections.iter().map(|s| s.value.id).collect()
    }

    /// Owned copies of the contributing values.
    pub fn values(&self) -> Vec<ProductOptionValue> {
        self.selections.iter().map(|s| s.value.clone()).collect()
    }
}

/// Number of combinations `options` expands to.
pub fn combination_count(options: &[ProductOption]) -> usize {
    if options.is_empty() {
        return 0;
    }
    options
        .iter()
        .fold(1usize, |acc, o| acc.saturating_mul(o.values.len()))
}

/// Iterate the Cartesian product of `options`' values.
pub fn combinations(options: &[ProductOption]) -> Combinations<'_> {
    let remaining = combination_count(options);
    let cursor = (remaining > 0).then(|| vec![0; options.len()]);
    Combinations {
        options,
        cursor,
        remaining,
    }
}

/// Iterator over combinations, driven by an odometer over value indices.
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    options: &'a [ProductOption],
    cursor: Option<Vec<usize>>,
    remaining: usize,
}

impl<'a> Combinations<'a> {
    fn advance(&mut self) {
        let Some(cursor) = self.cursor.as_mut() else {
            return;
        };
        // last option varies fastest
        for i in (0..cursor.len()).rev() {
            cursor[i] += 1;
            if cursor[i] < self.options[i].values.len() {
                return;
            }
            cursor[i] = 0;
        }
        self.cursor = None;
    }
}

impl<'a> Iterator for Combinations<'a> {
    type Item = Combination<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_ref()?;
        let options = self.options;
        let selections = cursor
            .iter()
            .zip(options)
            .map(|(&idx, option)| Selection {
                option_name: option.name.as_str(),
                value: &option.values[idx],
            })
            .collect();

        self.advance();
        self.remaining = self.remaining.saturating_sub(1);
        Some(Combination { selections })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Combinations<'_> {}

impl core::iter::FusedIterator for Combinations<'_> {}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use storefront_core::{ProductOptionId, ProductRootId};

    /// Build persisted-looking options with sequential ids.
    pub(crate) fn test_options(groups: &[(&str, &[&str])]) -> Vec<ProductOption> {
        let created_on = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let mut next_value_id = 1;
        groups
            .iter()
            .enumerate()
            .map(|(i, (name, values))| {
                let option_id = ProductOptionId::new(i as i64 + 1);
                let values = values
                    .iter()
                    .map(|v| {
                        let value = ProductOptionValue {
                            id: ProductOptionValueId::new(next_value_id),
                            product_option_id: option_id,
                            value: v.to_string(),
                            created_on,
                            updated_on: None,
                            archived_on: None,
                        };
                        next_value_id += 1;
                        value
                    })
                    .collect();
                ProductOption {
                    id: option_id,
                    name: name.to_string(),
                    product_root_id: ProductRootId::new(1),
                    values,
                    created_on,
                    updated_on: None,
                    archived_on: None,
                }
            })
            .collect()
    }

    fn size_and_color() -> Vec<ProductOption> {
        test_options(&[
            ("Size", &["small", "medium", "large"]),
            ("Color", &["red", "green", "blue"]),
        ])
    }

    fn pairs(options: &[ProductOption]) -> Vec<(String, String)> {
        combinations(options)
            .map(|c| {
                let s = c.selections();
                (s[0].value.value.clone(), s[1].value.value.clone())
            })
            .collect()
    }

    #[test]
    fn last_option_varies_fastest() {
        let options = size_and_color();
        let got = pairs(&options);

        assert_eq!(got.len(), 9);
        assert_eq!(got[0], ("small".into(), "red".into()));
        assert_eq!(got[1], ("small".into(), "green".into()));
        assert_eq!(got[2], ("small".into(), "blue".into()));
        assert_eq!(got[3], ("medium".into(), "red".into()));
        assert_eq!(got[8], ("large".into(), "blue".into()));
    }

    #[test]
    fn suffix_and_summary_follow_option_order() {
        let options = size_and_color();
        let first = combinations(&options).next().unwrap();

        assert_eq!(first.sku_suffix(), "small_red");
        assert_eq!(first.summary(), "Size: small, Color: red");
        assert_eq!(
            first.option_value_ids(),
            vec![ProductOptionValueId::new(1), ProductOptionValueId::new(4)]
        );
    }

    #[test]
    fn suffix_is_lower_cased() {
        let options = test_options(&[("Size", &["XL"]), ("Color", &["Navy-Blue"])]);
        let only = combinations(&options).next().unwrap();
        assert_eq!(only.sku_suffix(), "xl_navy-blue");
        assert_eq!(only.summary(), "Size: XL, Color: Navy-Blue");
    }

    #[test]
    fn single_value_option_is_fixed_in_every_tuple() {
        let options = test_options(&[("Material", &["cotton"]), ("Size", &["s", "m"])]);
        let suffixes: Vec<_> = combinations(&options).map(|c| c.sku_suffix()).collect();
        assert_eq!(suffixes, vec!["cotton_s", "cotton_m"]);
    }

    #[test]
    fn empty_inputs_yield_nothing() {
        assert_eq!(combinations(&[]).count(), 0);

        let options = test_options(&[("Size", &["s"]), ("Color", &[])]);
        assert_eq!(combination_count(&options), 0);
        assert_eq!(combinations(&options).count(), 0);
    }

    #[test]
    fn iterator_reports_exact_len() {
        let options = size_and_color();
        let mut iter = combinations(&options);
        assert_eq!(iter.len(), 9);
        iter.next();
        assert_eq!(iter.len(), 8);
        let rest: Vec<_> = iter.by_ref().collect();
        assert_eq!(rest.len(), 8);
        assert!(iter.next().is_none());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        fn arb_sizes() -> impl Strategy<Value = Vec<usize>> {
            prop::collection::vec(1usize..5, 1..5)
        }

        fn options_from_sizes(sizes: &[usize]) -> Vec<ProductOption> {
            let names: Vec<String> = (0..sizes.len()).map(|i| format!("opt{i}")).collect();
            let values: Vec<Vec<String>> = sizes
                .iter()
                .enumerate()
                .map(|(i, &k)| (0..k).map(|j| format!("v{i}x{j}")).collect())
                .collect();
            let value_refs: Vec<Vec<&str>> = values
                .iter()
                .map(|vs| vs.iter().map(String::as_str).collect())
                .collect();
            let groups: Vec<(&str, &[&str])> = names
                .iter()
                .zip(&value_refs)
                .map(|(n, vs)| (n.as_str(), vs.as_slice()))
                .collect();
            test_options(&groups)
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            #[test]
            fn produces_full_cross_product_without_duplicates(sizes in arb_sizes()) {
                let options = options_from_sizes(&sizes);
                let expected: usize = sizes.iter().product();

                let tuples: Vec<Vec<ProductOptionValueId>> =
                    combinations(&options).map(|c| c.option_value_ids()).collect();

                prop_assert_eq!(tuples.len(), expected);
                let unique: HashSet<_> = tuples.iter().cloned().collect();
                prop_assert_eq!(unique.len(), expected);

                // every tuple takes exactly one value from each option, in order
                for tuple in &tuples {
                    prop_assert_eq!(tuple.len(), options.len());
                    for (id, option) in tuple.iter().zip(&options) {
                        prop_assert!(option.values.iter().any(|v| v.id == *id));
                    }
                }
            }

            #[test]
            fn ordering_is_lexicographic_over_value_positions(sizes in arb_sizes()) {
                let options = options_from_sizes(&sizes);
                let positions: Vec<Vec<usize>> = combinations(&options)
                    .map(|c| {
                        c.selections()
                            .iter()
                            .zip(&options)
                            .map(|(s, o)| o.values.iter().position(|v| v.id == s.value.id).unwrap())
                            .collect()
                    })
                    .collect();

                for window in positions.windows(2) {
                    prop_assert!(window[0] < window[1]);
                }
            }

            #[test]
            fn generation_is_deterministic(sizes in arb_sizes()) {
                let options = options_from_sizes(&sizes);
                let a: Vec<String> = combinations(&options).map(|c| c.sku_suffix()).collect();
                let b: Vec<String> = combinations(&options).map(|c| c.sku_suffix()).collect();
                prop_assert_eq!(a, b);
            }
        }
    }
}
