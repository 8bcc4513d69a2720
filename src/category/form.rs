//! The fields shared by the new and edit category forms.

use maud::{Markup, html};

use crate::{
    category::{CategoryKind, MAX_CATEGORY_NAME_LENGTH},
    html::{
        FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE,
    },
};

/// Render a radio group named `name` for picking between income and expense.
pub fn kind_radio_group(name: &str, legend: &str, selected: CategoryKind) -> Markup {
    html! {
        fieldset class="space-y-2"
        {
            legend class=(FORM_LABEL_STYLE) { (legend) }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                @for kind in CategoryKind::ALL {
                    @let id = format!("{name}-{}", kind.as_str().to_lowercase());

                    div class="flex items-center gap-3"
                    {
                        input
                            name=(name)
                            id=(id)
                            type="radio"
                            value=(kind.as_str())
                            checked[kind == selected]
                            required
                            tabindex="0"
                            class=(FORM_RADIO_INPUT_STYLE);

                        label for=(id) class=(FORM_RADIO_LABEL_STYLE)
                        {
                            (kind)
                        }
                    }
                }
            }
        }
    }
}

/// Render the name and kind inputs of a category form.
pub fn category_form_fields(name: &str, kind: CategoryKind) -> Markup {
    html! {
        div
        {
            label
                for="name"
                class=(FORM_LABEL_STYLE)
            {
                "Category Name"
            }

            input
                id="name"
                type="text"
                name="name"
                placeholder="e.g. Groceries"
                value=(name)
                maxlength=(MAX_CATEGORY_NAME_LENGTH)
                required
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        (kind_radio_group("kind", "Type", kind))
    }
}
