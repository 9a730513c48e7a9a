//! Filter, sort and paginate display records

use crate::model::{DisplayFlight, FilterState, SortOption};
use std::cmp::Ordering;

/// Results shown per page
pub const PAGE_SIZE: usize = 5;

/// Airlines shown in the filter panel before "show all" is toggled
pub const COLLAPSED_AIRLINE_COUNT: usize = 6;

const PRICE_WEIGHT: f64 = 0.7;
const DURATION_WEIGHT: f64 = 0.3;

pub fn matches_filters(flight: &DisplayFlight, filters: &FilterState) -> bool {
    if filters.checked_bag && !flight.checked_bag {
        return false;
    }
    if filters.hand_baggage && !flight.hand_baggage {
        return false;
    }
    filters.airlines.is_empty() || filters.is_airline_selected(&flight.airline)
}

/// Flights passing `filters`, in their original order
pub fn filter_flights<'a>(flights: &'a [DisplayFlight], filters: &FilterState) -> Vec<&'a DisplayFlight> {
    flights
        .iter()
        .filter(|flight| matches_filters(flight, filters))
        .collect()
}

/// Weighted price/duration score used by [`SortOption::Best`]; lower is better
pub fn best_value_score(flight: &DisplayFlight) -> f64 {
    flight.price_sort_value as f64 * PRICE_WEIGHT + flight.duration_minutes as f64 * DURATION_WEIGHT
}

/// Stable sort; ties keep their input order
pub fn sort_flights(flights: &mut [&DisplayFlight], sort: SortOption) {
    match sort {
        SortOption::Cheapest => flights.sort_by_key(|f| f.price_sort_value),
        SortOption::Fastest => flights.sort_by_key(|f| f.duration_minutes),
        SortOption::Best => flights.sort_by(|a, b| {
            best_value_score(a)
                .partial_cmp(&best_value_score(b))
                .unwrap_or(Ordering::Equal)
        }),
    }
}

pub fn total_pages(count: usize) -> usize {
    count.div_ceil(PAGE_SIZE)
}

/// Records on 1-based `page`. Pages outside `1..=total_pages` are empty.
pub fn paginate<T>(items: &[T], page: usize) -> &[T] {
    if page == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(PAGE_SIZE);
    if start >= items.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(items.len());
    &items[start..end]
}

/// Distinct airline names in first-occurrence order
pub fn airline_facets(flights: &[DisplayFlight]) -> Vec<String> {
    let mut airlines: Vec<String> = Vec::new();
    for flight in flights {
        if !airlines.contains(&flight.airline) {
            airlines.push(flight.airline.clone());
        }
    }
    airlines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::placeholder_flight;

    fn flight(id: usize, airline: &str, price: i64, duration: i64) -> DisplayFlight {
        DisplayFlight {
            airline: airline.to_string(),
            price_sort_value: price,
            duration_minutes: duration,
            checked_bag: price > 100,
            ..placeholder_flight(id - 1)
        }
    }

    fn ids(flights: &[&DisplayFlight]) -> Vec<usize> {
        flights.iter().map(|f| f.id).collect()
    }

    #[test]
    fn test_cheapest_sort_is_stable() {
        let flights = vec![flight(1, "A", 50, 60), flight(2, "A", 30, 90), flight(3, "A", 30, 45)];
        let mut refs: Vec<&DisplayFlight> = flights.iter().collect();
        sort_flights(&mut refs, SortOption::Cheapest);

        let prices: Vec<i64> = refs.iter().map(|f| f.price_sort_value).collect();
        assert_eq!(prices, vec![30, 30, 50]);
        assert_eq!(ids(&refs), vec![2, 3, 1]);
    }

    #[test]
    fn test_fastest_sort() {
        let flights = vec![flight(1, "A", 50, 300), flight(2, "A", 90, 120), flight(3, "A", 10, 120)];
        let mut refs: Vec<&DisplayFlight> = flights.iter().collect();
        sort_flights(&mut refs, SortOption::Fastest);
        assert_eq!(ids(&refs), vec![2, 3, 1]);
    }

    #[test]
    fn test_best_sort_weights_price_and_duration() {
        // scores: 0.7*200+0.3*60=158, 0.7*150+0.3*300=195, 0.7*180+0.3*60=144
        let flights = vec![flight(1, "A", 200, 60), flight(2, "A", 150, 300), flight(3, "A", 180, 60)];
        let mut refs: Vec<&DisplayFlight> = flights.iter().collect();
        sort_flights(&mut refs, SortOption::Best);
        assert_eq!(ids(&refs), vec![3, 1, 2]);
        assert!((best_value_score(&flights[0]) - 158.0).abs() < 1e-9);
    }

    #[test]
    fn test_airline_filter() {
        let flights = vec![flight(1, "IndiGo", 50, 60), flight(2, "Vistara", 150, 60), flight(3, "IndiGo", 200, 60)];
        let mut filters = FilterState::default();
        filters.toggle_airline("IndiGo");

        let filtered = filter_flights(&flights, &filters);
        assert_eq!(ids(&filtered), vec![1, 3]);
        assert!(filtered.iter().all(|f| f.airline == "IndiGo"));

        filters.checked_bag = true;
        let filtered = filter_flights(&flights, &filters);
        assert_eq!(ids(&filtered), vec![3]);
    }

    #[test]
    fn test_baggage_filters() {
        let mut no_hand_bag = flight(2, "A", 150, 60);
        no_hand_bag.hand_baggage = false;
        let flights = vec![flight(1, "A", 50, 60), no_hand_bag];

        let filters = FilterState {
            hand_baggage: true,
            ..FilterState::default()
        };
        assert_eq!(ids(&filter_flights(&flights, &filters)), vec![1]);

        let filters = FilterState {
            checked_bag: true,
            ..FilterState::default()
        };
        assert_eq!(ids(&filter_flights(&flights, &filters)), vec![2]);

        assert_eq!(filter_flights(&flights, &FilterState::default()).len(), 2);
    }

    #[test]
    fn test_pagination() {
        let items: Vec<usize> = (1..=12).collect();
        assert_eq!(total_pages(items.len()), 3);
        assert_eq!(paginate(&items, 1), &[1, 2, 3, 4, 5]);
        assert_eq!(paginate(&items, 3), &[11, 12]);
        assert!(paginate(&items, 4).is_empty());
        assert!(paginate(&items, 0).is_empty());

        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(5), 1);
        assert_eq!(total_pages(6), 2);
    }

    #[test]
    fn test_airline_facets_first_occurrence_order() {
        let flights = vec![
            flight(1, "Vistara", 50, 60),
            flight(2, "IndiGo", 50, 60),
            flight(3, "Vistara", 50, 60),
            flight(4, "Air India", 50, 60),
        ];
        assert_eq!(airline_facets(&flights), vec!["Vistara", "IndiGo", "Air India"]);
    }
}
