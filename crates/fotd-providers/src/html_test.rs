use super::*;

#[test]
fn clean_text_strips_tags_and_normalizes_space() {
    let text = clean_text("<span>Chocolate\n   <em>Covered</em></span>  Cherry");
    assert_eq!(text, "Chocolate Covered Cherry");
}

#[test]
fn clean_text_decodes_entities() {
    assert_eq!(clean_text("Cookies &amp; Cream"), "Cookies & Cream");
    assert_eq!(clean_text("Today&rsquo;s"), "Today\u{2019}s");
}

#[test]
fn headings_capture_tag_attrs_and_text() {
    let html = r#"<div><h2 class="title">Turtle</h2><h3>Today&#8217;s Flavor of the Day</h3></div>"#;
    let found = headings(html);
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].tag, "h2");
    assert_eq!(found[0].text, "Turtle");
    assert!(found[0].has_class("title"));
    assert_eq!(normalize_label(&found[1].text), "today's flavor of the day");
    assert!(found[0].start < found[1].start);
}

#[test]
fn next_data_parses_embedded_json() {
    let html = r#"<script id="__NEXT_DATA__" type="application/json">{"props":{"x":1}}</script>"#;
    let data = next_data(html).unwrap();
    assert_eq!(data["props"]["x"], 1);
}

#[test]
fn next_data_absent_or_invalid_is_none() {
    assert!(next_data("<html></html>").is_none());
    assert!(next_data(r#"<script id="__NEXT_DATA__">{not json</script>"#).is_none());
}

#[test]
fn jsonld_nodes_flatten_arrays_and_graphs() {
    let html = r#"
        <script type="application/ld+json">[{"@type":"Organization"},{"@type":"Restaurant"}]</script>
        <script type="application/ld+json">{"@graph":[{"@type":["LocalBusiness","Store"]}]}</script>
        <script type="application/ld+json">{broken</script>
    "#;
    let nodes = jsonld_nodes(html);
    assert!(nodes.iter().any(|n| jsonld_type_is(n, &["restaurant"])));
    assert!(nodes.iter().any(|n| jsonld_type_is(n, &["Store"])));
    assert!(!nodes.iter().any(|n| jsonld_type_is(n, &["Event"])));
}

#[test]
fn find_element_with_class_returns_offset_after_tag() {
    let html = r#"<section class="hero"></section><div class="wp-block flavor-of-the-day-box"><h3>Butter Pecan</h3></div>"#;
    let offset = find_element_with_class(html, "flavor-of-the-day").unwrap();
    assert!(html[offset..].starts_with("<h3>"));
    assert!(find_element_with_class(html, "missing").is_none());
}

#[test]
fn elements_with_id_lists_ids_in_order() {
    let html = r#"<div id="27"><h3>A</h3></div><span id="x"></span><div class="c" id="28"></div>"#;
    let ids: Vec<&str> = elements_with_id(html, "div").into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, ["27", "28"]);
}

#[test]
fn text_lines_split_on_block_elements() {
    let html = "<ul><li>Sep 27: Cookies &amp; Cream</li><li>Sep 28:<br>Mint</li></ul><script>var x = 1;</script>";
    assert_eq!(text_lines(html), ["Sep 27: Cookies & Cream", "Sep 28:", "Mint"]);
}
