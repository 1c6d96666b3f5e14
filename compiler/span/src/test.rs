use crate::{span, Location, PossiblySpanning, Span, Spanned, Spanning};
use std::cmp::Ordering;

#[test]
fn advancing_over_astral_characters_takes_two_columns() {
    let location = Location::START.advance('\u{1F600}');

    assert_eq!(location, Location::new(1, 3));
    assert_eq!(location.next_line(), Location::new(2, 1));
}

#[test]
fn relate_location_to_span() {
    let span = span(2, 5, 2, 9);

    assert_eq!(Location::new(1, 80).relate(span), Ordering::Less);
    assert_eq!(Location::new(2, 5).relate(span), Ordering::Equal);
    assert_eq!(Location::new(2, 9).relate(span), Ordering::Greater);
}

#[test]
fn merge_takes_outermost_bounds() {
    let left = span(1, 1, 1, 4);
    let right = span(3, 2, 3, 7);

    assert_eq!(left.merge(right), span(1, 1, 3, 7));
    assert_eq!(right.merge(left), span(1, 1, 3, 7));
    assert_eq!(left.merge(None::<Span>), left);
}

#[test]
fn merging_passes_through() {
    let mut span = span(1, 1, 1, 2);
    let item = Spanned::new(self::span(1, 3, 1, 8), "item");

    let item = span.merging(item);

    assert_eq!(item.bare, "item");
    assert_eq!(span, self::span(1, 1, 1, 8));
}

#[test]
fn sequence_spans() {
    let items = vec![
        Spanned::new(span(1, 1, 1, 2), ()),
        Spanned::new(span(1, 4, 1, 6), ()),
    ];

    assert_eq!(items.possible_span(), Some(span(1, 1, 1, 6)));
    assert_eq!(Vec::<Spanned<()>>::new().possible_span(), None);
    assert_eq!(items[1].span(), span(1, 4, 1, 6));
}
