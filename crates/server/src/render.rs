//! HTML rendering for the results page.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use giftfinder_marketplace::Listing;

use crate::finder::{ResultsPage, SuggestionResults};

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:2rem auto;max-width:72rem;padding:0 1rem;color:#222}\
form{display:flex;gap:.5rem;margin-bottom:1rem}\
input[type=text]{flex:1;padding:.5rem;font-size:1rem}\
.summary{color:#666;margin-bottom:2rem}\
section{margin-bottom:2rem}\
.row{display:grid;gap:1rem}\
.card{display:block;text-decoration:none;color:inherit}\
.card img{width:100%;aspect-ratio:4/3;object-fit:cover;border-radius:.25rem;background:#eee}\
.card span{display:block;font-size:.85rem;margin-top:.25rem;overflow:hidden;text-overflow:ellipsis;white-space:nowrap}\
.empty{color:#888}";

pub fn render_page(page: &ResultsPage) -> String {
    let title = text(&page.title);
    let columns = page.num_results.max(1);

    let mut html = format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}.row{{grid-template-columns:repeat({columns},1fr)}}</style>\n\
         </head>\n<body>\n<h1>{title}</h1>\n\
         <form method=\"get\" action=\"/\">\
         <input type=\"text\" name=\"query\" value=\"{query}\" placeholder=\"Who is the gift for?\">\
         <button type=\"submit\">Find gifts</button></form>\n\
         <p class=\"summary\">{ideas} gift ideas requested, up to {results} listings each</p>\n",
        query = attr(&page.query),
        ideas = page.num_ideas,
        results = page.num_results,
    );

    for group in &page.groups {
        render_group(&mut html, group);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_group(html: &mut String, group: &SuggestionResults) {
    html.push_str(&format!(
        "<section>\n<h2><a href=\"{}\">{}</a></h2>\n",
        attr(&group.search_url),
        text(&group.phrase)
    ));

    if group.listings.is_empty() {
        html.push_str("<p class=\"empty\">No listings found.</p>\n</section>\n");
        return;
    }

    html.push_str("<div class=\"row\">\n");
    for listing in &group.listings {
        render_listing(html, listing);
    }
    html.push_str("</div>\n</section>\n");
}

fn render_listing(html: &mut String, listing: &Listing) {
    html.push_str(&format!("<a class=\"card\" href=\"{}\"", attr(&listing.href)));
    if let Some(id) = &listing.id {
        html.push_str(&format!(" data-listing-id=\"{}\"", attr(id)));
    }
    if let Some(position) = &listing.position {
        html.push_str(&format!(" data-position-num=\"{}\"", attr(position)));
    }
    html.push('>');
    match &listing.thumbnail {
        Some(src) => html.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
            attr(src),
            attr(&listing.title)
        )),
        None => html.push_str("<img alt=\"\">"),
    }
    html.push_str(&format!("<span>{}</span></a>\n", text(&listing.title)));
}
