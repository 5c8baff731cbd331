// Interactive prompt commands, without any terminal I/O.
use crate::output::page_count;
use crate::resolver::{Dashboard, SelectionEvent};

/// What the prompt loop does after one line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Quit,
    /// Redraw the active view at this 0-based page.
    Show { page: usize },
}

/// Apply one typed line to the dashboard.
///
/// Options are matched first, so an option keyed `n`, `p` or `q` stays
/// selectable; otherwise `q` quits and `n`/`p` page through the view.
/// Unknown input leaves both selection and page as they were. A new
/// selection starts on its first page.
pub fn apply_choice(dash: &mut Dashboard, page: usize, choice: &str) -> Step {
    let event = SelectionEvent::from_input(choice);
    if dash.registry().find(&event).is_some() {
        let before = dash.selection().clone();
        dash.handle(&event);
        let page = if *dash.selection() == before { page } else { 0 };
        return Step::Show { page };
    }
    match choice.trim() {
        "q" | "Q" => Step::Quit,
        "n" | "N" => {
            let last = page_count(&dash.view()) - 1;
            Step::Show {
                page: (page + 1).min(last),
            }
        }
        "p" | "P" => Step::Show {
            page: page.saturating_sub(1),
        },
        _ => {
            dash.handle(&event);
            Step::Show { page }
        }
    }
}
