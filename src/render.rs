//! Plain-text presentation of the results view

use crate::client::FlightsApi;
use crate::model::{DisplayFlight, FilterState, SortOption};
use crate::results::{FetchState, ResultsView};

const SORT_OPTIONS: [SortOption; 3] = [SortOption::Best, SortOption::Cheapest, SortOption::Fastest];

/// Render the whole view for its current state
pub fn render_view<A: FlightsApi>(view: &ResultsView<A>) -> String {
    let mut lines = vec![render_header(view)];

    if let Some(flight) = view.selected_flight() {
        lines.push(render_selected_summary(flight));
        return lines.join("\n\n");
    }

    if let FetchState::Loading = view.state() {
        lines.push("Loading flights...".to_string());
        return lines.join("\n\n");
    }

    if let Some(message) = view.error() {
        lines.push(format!("! {}", message));
    }

    if !view.flights().is_empty() {
        lines.push(format!(
            "Prices shown in original currencies | {} flights found",
            view.filtered_flights().len()
        ));
    }

    lines.push(render_filter_panel(view));

    let page = view.page_flights();
    if page.is_empty() {
        lines.push(render_no_flights());
    } else {
        lines.extend(page.into_iter().map(render_flight_card));
    }

    let pagination = render_pagination(view.current_page(), view.total_pages());
    if !pagination.is_empty() {
        lines.push(pagination);
    }

    lines.join("\n\n")
}

/// Route summary, result count and sort tabs
pub fn render_header<A: FlightsApi>(view: &ResultsView<A>) -> String {
    let route = match view.params() {
        Some(p) => {
            let travelers = if p.adults == "1" { "traveler" } else { "travelers" };
            let dates = match &p.return_date {
                Some(ret) => format!("{} - {}", p.departure, ret),
                None => p.departure.clone(),
            };
            format!(
                "{} -> {} | {} | {} {} | {}",
                p.origin, p.destination, dates, p.adults, travelers, p.trip_type
            )
        }
        None => "Flight search".to_string(),
    };

    format!(
        "{}\n{} flights | Sort: {}",
        route,
        view.filtered_flights().len(),
        render_sort_tabs(view.sort())
    )
}

pub fn render_sort_tabs(current: SortOption) -> String {
    SORT_OPTIONS
        .iter()
        .map(|option| {
            if *option == current {
                format!("[{}]", option)
            } else {
                option.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_filter_panel<A: FlightsApi>(view: &ResultsView<A>) -> String {
    let filters = view.filters();
    let mut lines = Vec::new();

    let toggle = if view.show_filters() { "hide" } else { "show" };
    if filters.is_active() {
        lines.push(format!("Filters ({}) [{}]", filters.active_count(), toggle));
    } else {
        lines.push(format!("Filters [{}]", toggle));
    }

    if view.show_filters() {
        if filters.is_active() {
            lines.push("  Clear all".to_string());
        }
        lines.push("  Baggage".to_string());
        lines.push(format!("    {} Checked bag", checkbox(filters.checked_bag)));
        lines.push(format!("    {} Hand baggage", checkbox(filters.hand_baggage)));
        lines.push("  Airlines".to_string());
        for airline in view.displayed_airlines() {
            lines.push(format!("    {} {}", checkbox(filters.is_airline_selected(airline)), airline));
        }
        if view.has_more_airlines() {
            let label = if view.show_all_airlines() {
                "Show less"
            } else {
                "Show all airlines"
            };
            lines.push(format!("    {}", label));
        }
    }

    if filters.is_active() {
        lines.push(format!("Active: {}", active_filter_chips(filters).join(", ")));
    }

    lines.join("\n")
}

fn active_filter_chips(filters: &FilterState) -> Vec<String> {
    let mut chips = Vec::new();
    if filters.checked_bag {
        chips.push("Checked bag".to_string());
    }
    if filters.hand_baggage {
        chips.push("Hand baggage".to_string());
    }
    chips.extend(filters.airlines.iter().cloned());
    chips
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x]"
    } else {
        "[ ]"
    }
}

pub fn render_flight_card(flight: &DisplayFlight) -> String {
    let mut baggage = Vec::new();
    if flight.checked_bag {
        baggage.push("Checked bag");
    }
    if flight.hand_baggage {
        baggage.push("Hand baggage");
    }

    format!(
        "#{id:<3} {airline:<28} {price:>12}\n     {dep_time} {dep}  --  {duration}, {stops}  --  {arr_time} {arr}\n     {baggage}",
        id = flight.id,
        airline = flight.airline,
        price = flight.price,
        dep_time = flight.departure_time,
        dep = flight.departure_airport,
        duration = flight.duration,
        stops = flight.stops,
        arr_time = flight.arrival_time,
        arr = flight.arrival_airport,
        baggage = baggage.join(" | "),
    )
}

/// Empty when there is at most one page
pub fn render_pagination(current_page: usize, total_pages: usize) -> String {
    if total_pages <= 1 {
        return String::new();
    }

    let pages: Vec<String> = (1..=total_pages)
        .map(|page| {
            if page == current_page {
                format!("[{}]", page)
            } else {
                page.to_string()
            }
        })
        .collect();

    let previous = if current_page == 1 { "  Previous" } else { "< Previous" };
    let next = if current_page == total_pages { "Next  " } else { "Next >" };
    format!("{}  {}  {}", previous, pages.join(" "), next)
}

pub fn render_no_flights() -> String {
    "No flights match your filters.\nTry adjusting your filters or clear all filters.".to_string()
}

pub fn render_selected_summary(flight: &DisplayFlight) -> String {
    format!(
        "Selected flight #{id}\n\
         {airline}  (rating {rating:.1})\n\
         Depart  {dep_time}  {dep}\n\
         Arrive  {arr_time}  {arr}\n\
         {duration} | {stops}\n\
         Price   {price}\n\
         Checked bag: {checked} | Hand baggage: {hand}\n\
         < Back to results",
        id = flight.id,
        airline = flight.airline,
        rating = flight.rating,
        dep_time = flight.departure_time,
        dep = flight.departure_airport,
        arr_time = flight.arrival_time,
        arr = flight.arrival_airport,
        duration = flight.duration,
        stops = flight.stops,
        price = flight.price,
        checked = yes_no(flight.checked_bag),
        hand = yes_no(flight.hand_baggage),
    )
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "included"
    } else {
        "not included"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::placeholder_flight;

    #[test]
    fn test_pagination_bar() {
        assert_eq!(render_pagination(1, 1), "");
        assert_eq!(render_pagination(1, 0), "");
        assert_eq!(render_pagination(1, 3), "  Previous  [1] 2 3  Next >");
        assert_eq!(render_pagination(3, 3), "< Previous  1 2 [3]  Next  ");
    }

    #[test]
    fn test_sort_tabs() {
        assert_eq!(render_sort_tabs(SortOption::Best), "[best] cheapest fastest");
        assert_eq!(render_sort_tabs(SortOption::Fastest), "best cheapest [fastest]");
    }

    #[test]
    fn test_flight_card_contents() {
        let flight = DisplayFlight {
            airline: "IndiGo".to_string(),
            price: "$250".to_string(),
            stops: "1 stop".to_string(),
            duration: "3h 5m".to_string(),
            checked_bag: true,
            ..placeholder_flight(0)
        };
        let card = render_flight_card(&flight);
        assert!(card.starts_with("#1"));
        assert!(card.contains("IndiGo"));
        assert!(card.contains("$250"));
        assert!(card.contains("3h 5m, 1 stop"));
        assert!(card.contains("Checked bag | Hand baggage"));
    }

    #[test]
    fn test_filter_chips_keep_selection_order() {
        let mut filters = FilterState::default();
        filters.toggle_airline("Vistara");
        filters.toggle_airline("Air India");
        filters.hand_baggage = true;
        assert_eq!(active_filter_chips(&filters), vec!["Hand baggage", "Vistara", "Air India"]);
    }

    #[test]
    fn test_selected_summary() {
        let summary = render_selected_summary(&placeholder_flight(4));
        assert!(summary.starts_with("Selected flight #5"));
        assert!(summary.contains("Unknown Airline  (rating 3.0)"));
        assert!(summary.contains("Checked bag: not included | Hand baggage: included"));
    }
}
