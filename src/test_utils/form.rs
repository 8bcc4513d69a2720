use scraper::{ElementRef, Html, Selector};

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|error| panic!("bad selector {css:?}: {error}"))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&selector("form")).next().expect("No form found")
}

/// Check that `form` sends its request to `endpoint` with the HTMX `attribute`,
/// e.g. `hx-post` or `hx-put`.
#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let got = form.value().attr(attribute);

    assert_eq!(
        got,
        Some(endpoint),
        "want form with attribute {attribute}=\"{endpoint}\", got {got:?}"
    );
}

/// Find the required input called `name` and check its type.
#[track_caller]
fn must_get_required_input<'a>(form: &ElementRef<'a>, name: &str, type_: &str) -> ElementRef<'a> {
    let input = form
        .select(&selector(&format!("input[name='{name}']")))
        .next()
        .unwrap_or_else(|| panic!("No input found with name \"{name}\""));
    let got_type = input.value().attr("type").unwrap_or_default();

    assert_eq!(
        got_type, type_,
        "want input {name} with type \"{type_}\", got {got_type:?}"
    );
    assert!(
        input.value().attr("required").is_some(),
        "want input {name} to have the required attribute"
    );

    input
}

#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, type_: &str) {
    must_get_required_input(form, name, type_);
}

#[track_caller]
pub(crate) fn assert_form_input_with_value(
    form: &ElementRef<'_>,
    name: &str,
    type_: &str,
    value: &str,
) {
    let input = must_get_required_input(form, name, type_);
    let got_value = input.value().attr("value").unwrap_or_default();

    assert_eq!(
        got_value, value,
        "want input {name} with value \"{value}\", got {got_value:?}"
    );
}

#[track_caller]
fn must_get_submit_button<'a>(form: &ElementRef<'a>) -> ElementRef<'a> {
    let button = form.select(&selector("button")).next().expect("No button found");

    assert_eq!(
        button.value().attr("type"),
        Some("submit"),
        "want the first button of the form to have type=\"submit\""
    );

    button
}

#[track_caller]
pub(crate) fn assert_form_submit_button(form: &ElementRef<'_>) {
    must_get_submit_button(form);
}

#[track_caller]
pub(crate) fn assert_form_submit_button_with_text(form: &ElementRef<'_>, text: &str) {
    let button = must_get_submit_button(form);

    assert_eq!(text_of(button), text);
}

/// Check the first paragraph of `form`, which is where field errors are rendered.
#[track_caller]
pub(crate) fn assert_form_error_message(form: &ElementRef<'_>, want_error_message: &str) {
    let paragraph = form
        .select(&selector("p"))
        .next()
        .expect("No error message found");

    assert_eq!(want_error_message, text_of(paragraph));
}

#[track_caller]
pub(crate) fn assert_form_select(form: &ElementRef<'_>, name: &str, selected_value: &str) {
    let select = form
        .select(&selector(&format!("select[name='{name}']")))
        .next()
        .unwrap_or_else(|| panic!("No select found with name \"{name}\""));

    let selected = select
        .select(&selector("option[selected]"))
        .map(|option| option.value().attr("value").unwrap_or_default())
        .collect::<Vec<_>>();

    assert_eq!(
        selected,
        [selected_value],
        "want select {name} to have only \"{selected_value}\" selected, got {selected:?}"
    );
}

#[track_caller]
pub(crate) fn assert_form_radio_checked(form: &ElementRef<'_>, name: &str, value: &str) {
    let radios = form
        .select(&selector(&format!("input[type=radio][name='{name}']")))
        .collect::<Vec<_>>();

    assert!(!radios.is_empty(), "No radio inputs found with name \"{name}\"");

    let checked = radios
        .iter()
        .filter(|radio| radio.value().attr("checked").is_some())
        .filter_map(|radio| radio.value().attr("value"))
        .collect::<Vec<_>>();

    assert_eq!(
        checked,
        [value],
        "want only the {name} radio with value \"{value}\" checked, got {checked:?}"
    );
}
