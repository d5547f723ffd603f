//! Some utility functions

use chrono::{DateTime, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use minidom::Element;

pub mod comparison;

/// Walks an XML tree and returns every element that has the given name
pub fn find_elems<S: AsRef<str>>(root: &Element, searched_name: S) -> Vec<&Element> {
    let searched_name = searched_name.as_ref();
    let mut elems: Vec<&Element> = Vec::new();

    for el in root.children() {
        if el.name() == searched_name {
            elems.push(el);
        } else {
            let ret = find_elems(el, searched_name);
            elems.extend(ret);
        }
    }
    elems
}

/// Walks an XML tree until it finds an elements with the given name
pub fn find_elem<S: AsRef<str>>(root: &Element, searched_name: S) -> Option<&Element> {
    let searched_name = searched_name.as_ref();
    if root.name() == searched_name {
        return Some(root);
    }

    for el in root.children() {
        if el.name() == searched_name {
            return Some(el);
        } else {
            let ret = find_elem(el, searched_name);
            if ret.is_some() {
                return ret;
            }
        }
    }
    None
}

/// Turn a wall-clock time of `tz` into an instant.
///
/// Ambiguous times (when clocks go back) resolve to the earliest instant.
/// Times that do not exist (when clocks go forward) are read with the offset in force before the jump,
/// which lands on the same distance past the transition.
pub fn localize(tz: &Tz, naive: &NaiveDateTime) -> DateTime<Utc> {
    if let Some(dt) = tz.from_local_datetime(naive).earliest() {
        return dt.with_timezone(&Utc);
    }

    let before_gap = *naive - chrono::Duration::hours(24);
    let offset = tz.offset_from_utc_datetime(&before_gap).fix();
    let utc = *naive - chrono::Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&utc)
}


#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_find_elems() {
        let xml = r#"<d:multistatus xmlns:d="DAV:">
            <d:response><d:href>/a/</d:href></d:response>
            <d:response><d:href>/b/</d:href></d:response>
        </d:multistatus>"#;
        let root: Element = xml.parse().unwrap();

        let hrefs: Vec<String> = find_elems(&root, "href").iter().map(|e| e.text()).collect();
        assert_eq!(hrefs, vec!["/a/".to_string(), "/b/".to_string()]);
        assert_eq!(find_elem(&root, "href").map(|e| e.text()), Some("/a/".to_string()));
        assert!(find_elem(&root, "displayname").is_none());
    }

    #[test]
    fn test_localize() {
        let paris: Tz = "Europe/Paris".parse().unwrap();

        let naive = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap().and_hms_opt(9, 0, 0).unwrap();
        assert_eq!(localize(&paris, &naive).to_rfc3339(), "2026-01-10T08:00:00+00:00");

        // 02:30 does not exist on the last Sunday of March
        let in_gap = NaiveDate::from_ymd_opt(2026, 3, 29).unwrap().and_hms_opt(2, 30, 0).unwrap();
        assert_eq!(localize(&paris, &in_gap).to_rfc3339(), "2026-03-29T01:30:00+00:00");

        // 02:30 happens twice on the last Sunday of October
        let ambiguous = NaiveDate::from_ymd_opt(2026, 10, 25).unwrap().and_hms_opt(2, 30, 0).unwrap();
        assert_eq!(localize(&paris, &ambiguous).to_rfc3339(), "2026-10-25T00:30:00+00:00");
    }
}
