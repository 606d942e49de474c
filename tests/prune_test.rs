use sitespec::dom;
use sitespec::prune::{prune_children, should_prune, Density, DEFAULT_THRESHOLD};

fn prune_root(html: &str) -> dom::Document {
    let doc = dom::parse(html);
    let root = doc.select("#root").nodes()[0];
    prune_children(&root, DEFAULT_THRESHOLD);
    doc
}

#[test]
fn three_periods_are_kept() {
    let d = Density::measure("...");
    assert_eq!((d.nonspecial, d.special), (3, 0));
    assert!(!should_prune("span", "...", DEFAULT_THRESHOLD));
}

#[test]
fn all_special_leaf_is_pruned() {
    let doc = prune_root("<div id='root'><span id='noise'>@#$%</span><p>Some words.</p></div>");
    assert!(doc.select("#noise").is_empty());
    assert!(doc.select("#root p").exists());
}

#[test]
fn parent_of_surviving_child_is_never_pruned() {
    let doc = prune_root("<div id='root'><div id='parent'>@#$%@#$%<p id='child'>Readable child text.</p>&amp;&amp;</div></div>");
    assert!(doc.select("#parent").exists());
    assert!(doc.select("#child").exists());
}

#[test]
fn line_breaks_always_survive() {
    let doc = prune_root("<div id='root'><br><p>Text<br>more</p><br/></div>");
    assert_eq!(doc.select("br").length(), 3);
}

#[test]
fn whitespace_does_not_count_toward_ratio() {
    // Two special, two nonspecial; whitespace is excluded from both.
    assert!(!should_prune("p", "a | b #", DEFAULT_THRESHOLD));
    assert!(should_prune("p", "a | # $", DEFAULT_THRESHOLD));
}

#[test]
fn unicode_letters_are_nonspecial() {
    assert!(!should_prune("p", "Café naïve 中文", DEFAULT_THRESHOLD));
}

#[test]
fn comment_child_makes_element_a_non_leaf() {
    let doc = prune_root("<div id='root'><span id='noted'>@#$%<!-- keep --></span><span id='noise'>@#$%</span></div>");
    assert!(doc.select("#noted").exists());
    assert!(doc.select("#noise").is_empty());
}
