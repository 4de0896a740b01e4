//! Tenure banding: maps months of service onto an ordered five-value category

use polars::prelude::*;
use std::fmt;
use std::str::FromStr;

/// Name of the derived column attached at load time
pub const TENURE_GROUP_COLUMN: &str = "tenure_group";

/// Name of the source column the band is derived from
pub const TENURE_MONTHS_COLUMN: &str = "tenure_months";

/// Ordered tenure band. Variant order is the category order used by
/// every grouping and chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TenureGroup {
    UnderOneYear,
    OneToTwoYears,
    TwoToFourYears,
    FourToFiveYears,
    OverFiveYears,
}

impl TenureGroup {
    /// All bands in declared order
    pub const ALL: [TenureGroup; 5] = [
        TenureGroup::UnderOneYear,
        TenureGroup::OneToTwoYears,
        TenureGroup::TwoToFourYears,
        TenureGroup::FourToFiveYears,
        TenureGroup::OverFiveYears,
    ];

    /// Display label of the band
    pub fn label(self) -> &'static str {
        match self {
            TenureGroup::UnderOneYear => "< 1 Year",
            TenureGroup::OneToTwoYears => "1-2 Year",
            TenureGroup::TwoToFourYears => "2-4 Year",
            TenureGroup::FourToFiveYears => "4-5 Year",
            TenureGroup::OverFiveYears => "> 5 Year",
        }
    }

    /// Labels in declared category order
    pub fn order() -> Vec<&'static str> {
        Self::ALL.iter().map(|group| group.label()).collect()
    }
}

impl fmt::Display for TenureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TenureGroup {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|group| group.label() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown tenure group: {}", s))
    }
}

/// Assign the tenure band for a number of months.
///
/// The third rule re-tests `m < 24`, which the first two rules already
/// claimed, so `2-4 Year` is never assigned. Only 49 to 59 months land in
/// `4-5 Year`; everything else from 24 upwards, 24 and 48 included, is
/// `> 5 Year`. Negative values are not validated and fall into `< 1 Year`.
pub fn classify_tenure(tenure_months: i64) -> TenureGroup {
    let m = tenure_months;
    if m <= 12 {
        TenureGroup::UnderOneYear
    } else if m > 12 && m < 24 {
        TenureGroup::OneToTwoYears
    } else if m < 24 && m <= 48 {
        TenureGroup::TwoToFourYears
    } else if m > 48 && m < 60 {
        TenureGroup::FourToFiveYears
    } else {
        TenureGroup::OverFiveYears
    }
}

/// Attach the `tenure_group` column to a frame holding `tenure_months`.
///
/// Every row receives a label; a null or non-integer tenure is an error.
pub fn attach_tenure_group(mut frame: DataFrame) -> crate::Result<DataFrame> {
    let tenure = frame
        .column(TENURE_MONTHS_COLUMN)?
        .cast(&DataType::Int64)?;

    let labels = tenure
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, months)| match months {
            Some(months) => Ok(classify_tenure(months).label()),
            None => anyhow::bail!("Missing {} at row {}", TENURE_MONTHS_COLUMN, row),
        })
        .collect::<crate::Result<Vec<&str>>>()?;

    frame.with_column(Series::new(TENURE_GROUP_COLUMN, labels))?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "< 1 Year")]
    #[case(1, "< 1 Year")]
    #[case(12, "< 1 Year")]
    #[case(13, "1-2 Year")]
    #[case(23, "1-2 Year")]
    #[case(24, "> 5 Year")]
    #[case(36, "> 5 Year")]
    #[case(48, "> 5 Year")]
    #[case(49, "4-5 Year")]
    #[case(59, "4-5 Year")]
    #[case(60, "> 5 Year")]
    #[case(100, "> 5 Year")]
    fn test_classify_tenure_boundaries(#[case] months: i64, #[case] expected: &str) {
        assert_eq!(classify_tenure(months).label(), expected);
    }

    #[test]
    fn test_two_to_four_band_is_never_assigned() {
        for months in 0..=1000 {
            assert_ne!(classify_tenure(months), TenureGroup::TwoToFourYears);
        }
        for months in 24..=48 {
            assert_eq!(classify_tenure(months), TenureGroup::OverFiveYears);
        }
    }

    #[test]
    fn test_negative_tenure_is_not_rejected() {
        assert_eq!(classify_tenure(-5), TenureGroup::UnderOneYear);
    }

    #[test]
    fn test_classify_is_total() {
        for months in 0..=1000 {
            let group = classify_tenure(months);
            assert!(TenureGroup::ALL.contains(&group));
        }
    }

    #[test]
    fn test_declared_order() {
        assert_eq!(
            TenureGroup::order(),
            vec!["< 1 Year", "1-2 Year", "2-4 Year", "4-5 Year", "> 5 Year"]
        );
        assert!(TenureGroup::UnderOneYear < TenureGroup::OverFiveYears);
        let mut shuffled = vec![
            TenureGroup::OverFiveYears,
            TenureGroup::UnderOneYear,
            TenureGroup::FourToFiveYears,
        ];
        shuffled.sort();
        assert_eq!(shuffled[0], TenureGroup::UnderOneYear);
        assert_eq!(shuffled[2], TenureGroup::OverFiveYears);
    }

    #[test]
    fn test_label_round_trip() {
        for group in TenureGroup::ALL {
            assert_eq!(group.label().parse::<TenureGroup>().unwrap(), group);
        }
        assert!("6+ Year".parse::<TenureGroup>().is_err());
    }

    #[test]
    fn test_attach_tenure_group() {
        let months = [0i64, 12, 13, 24, 48, 61];
        let frame = DataFrame::new(vec![Series::new(TENURE_MONTHS_COLUMN, months.to_vec())]).unwrap();

        let frame = attach_tenure_group(frame).unwrap();
        assert_eq!(frame.height(), months.len());

        let labels: Vec<&str> = frame
            .column(TENURE_GROUP_COLUMN)
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        for (m, label) in months.iter().zip(labels) {
            assert_eq!(label, classify_tenure(*m).label());
        }
    }

    #[test]
    fn test_attach_tenure_group_rejects_null() {
        let frame = DataFrame::new(vec![Series::new(
            TENURE_MONTHS_COLUMN,
            vec![Some(3i64), None],
        )])
        .unwrap();
        assert!(attach_tenure_group(frame).is_err());
    }
}
