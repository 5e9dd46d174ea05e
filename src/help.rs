// ABOUTME: REPL documentation for special forms, derived from the dispatch registrations
//
// There is no separate help store to populate: the same inventory
// submissions that build the dispatch table carry signature, description,
// examples, and see-also data, and this module exposes a sorted, immutable
// view over them plus the markdown rendering used by the REPL.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::lower::{registered_forms, FormRegistration};

/// Sorted lookup over every registered special form. Built once on first
/// use; keys are the head symbols, so iteration order is stable and
/// alphabetical without any per-call sorting.
pub struct HelpIndex {
    by_name: BTreeMap<&'static str, &'static FormRegistration>,
}

impl HelpIndex {
    fn build() -> Self {
        let by_name = registered_forms().map(|form| (form.name, form)).collect();
        HelpIndex { by_name }
    }

    /// Documentation for one head symbol
    pub fn entry(&self, name: &str) -> Option<&'static FormRegistration> {
        self.by_name.get(name).copied()
    }

    /// Forms grouped by category, each group in name order
    pub fn categories(&self) -> BTreeMap<&'static str, Vec<&'static FormRegistration>> {
        let mut groups: BTreeMap<&'static str, Vec<&'static FormRegistration>> = BTreeMap::new();
        for form in self.by_name.values().copied() {
            groups.entry(form.category).or_default().push(form);
        }
        groups
    }

    /// All documented head symbols, in order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_name.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// The process-wide help index
pub fn index() -> &'static HelpIndex {
    static INDEX: OnceLock<HelpIndex> = OnceLock::new();
    INDEX.get_or_init(HelpIndex::build)
}

// ============================================================================
// Markdown Rendering
// ============================================================================

/// Render one form's documentation as markdown for the terminal
pub fn format_form_help(form: &FormRegistration) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {} — {}\n\n", form.name, form.category));
    output.push_str(&format!("**Signature:** `{}`\n\n", form.signature));
    output.push_str(form.description);
    output.push('\n');

    if !form.examples.is_empty() {
        output.push_str("\n**Examples:**\n\n");
        for example in form.examples {
            for line in example.lines() {
                output.push_str(&format!("    {}\n", line));
            }
        }
    }

    if !form.related.is_empty() {
        output.push_str(&format!("\n**See also:** {}\n", form.related.join(", ")));
    }

    output
}

/// Categories the overview leads with; anything else follows alphabetically
const CATEGORY_ORDER: [&str; 12] = [
    "Control Flow",
    "Bindings",
    "Functions",
    "Loops",
    "Operators",
    "Collections",
    "Data Access",
    "Classes",
    "Enums",
    "JS Interop",
    "Modules",
    "Quoting",
];

/// Render the all-forms overview as markdown
pub fn format_overview() -> String {
    let groups = index().categories();

    let mut output = String::new();
    output.push_str(&format!("# Special Forms ({} total)\n\n", index().len()));

    let write_group = |output: &mut String, category: &str| {
        if let Some(forms) = groups.get(category) {
            let names: Vec<&str> = forms.iter().map(|f| f.name).collect();
            output.push_str(&format!("**{}**: {}\n\n", category, names.join(", ")));
        }
    };

    for category in CATEGORY_ORDER {
        write_group(&mut output, category);
    }
    for category in groups.keys() {
        if !CATEGORY_ORDER.contains(category) {
            write_group(&mut output, category);
        }
    }

    output.push_str("Type `(help \"form\")` for details on one form.\n");
    output
}
