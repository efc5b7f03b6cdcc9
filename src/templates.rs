use maud::{DOCTYPE, Markup, html};

use crate::models::{
    CatalogResult, CatalogSource, DbStats, DiaryEntryView, DiaryStats, ListItemView, ListView,
    MediaType, Privacy, ReviewView, SearchType, SessionUser, TitleSummary, TitleView,
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";
const TMDB_POSTER_BASE: &str = "https://image.tmdb.org/t/p/w342";

const INPUT_CLASS: &str = "mt-2 w-full rounded-md border border-gray-300 px-3 py-2 focus:border-blue-500 focus:outline-none focus:ring-1 focus:ring-blue-500";
const BUTTON_CLASS: &str = "rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700";
const SMALL_BUTTON_CLASS: &str = "rounded-md bg-blue-600 px-3 py-1 text-sm font-semibold text-white hover:bg-blue-700";
const DANGER_BUTTON_CLASS: &str = "rounded-md bg-red-600 px-3 py-1 text-sm font-semibold text-white hover:bg-red-700";
const LABEL_CLASS: &str = "block text-sm font-medium text-gray-700";

/// One-off feedback carried back from a form post.
#[derive(Clone, Copy, Debug, Default)]
pub struct Banner<'a> {
    pub notice: Option<&'a str>,
    pub error: Option<&'a str>,
}

/// Catalog search state shown by the pages that pick titles from TMDB or TVmaze.
#[derive(Clone, Copy, Debug)]
pub struct CatalogSearch<'a> {
    pub query: &'a str,
    pub kind: SearchType,
    pub results: &'a [CatalogResult],
    pub error: Option<&'a str>,
}

/// A catalog hit chosen for diary logging, carried in the page URL.
#[derive(Clone, Debug)]
pub struct Pick {
    pub source: CatalogSource,
    pub external_id: i64,
    pub media_type: MediaType,
    pub title: String,
}

pub fn home_page(
    user: Option<&SessionUser>,
    month_label: &str,
    entries: &[DiaryEntryView],
    stats: &DiaryStats,
) -> String {
    page(
        "Movieboxd",
        user,
        html! {
            (search_form("", SearchType::Multi))

            section class="mt-10" {
                h2 class="text-xl font-semibold text-gray-900" { "Diary · " (month_label) }
                div class="mt-4 grid grid-cols-2 gap-4 md:grid-cols-4" {
                    (stat("Total", stats.total.to_string()))
                    (stat("This year", stats.year_count.to_string()))
                    (stat("This month", stats.month_count.to_string()))
                    (stat("Avg rating", format!("{:.1}", stats.avg_rating)))
                }
                @if entries.is_empty() {
                    p class="mt-6 text-gray-500" { "Nothing logged this month yet." }
                } @else {
                    ul class="mt-6 divide-y divide-gray-200 bg-white shadow rounded-lg" {
                        @for entry in entries {
                            li class="flex items-center justify-between px-6 py-3" {
                                div {
                                    @if let Some(title) = &entry.title {
                                        a class="font-medium text-gray-900 hover:text-blue-700" href=(title_href(title)) { (title.title) }
                                    }
                                    @if entry.rewatch {
                                        span class="ml-2 text-xs text-gray-500" { "rewatch" }
                                    }
                                }
                                div class="text-sm text-gray-600" {
                                    (entry.watched_on)
                                    @if let Some(rating) = entry.rating {
                                        " · " (stars(rating))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn search_page(
    user: Option<&SessionUser>,
    query: &str,
    kind: SearchType,
    results: &[CatalogResult],
    error: Option<&str>,
) -> String {
    page(
        "Search",
        user,
        html! {
            (search_form(query, kind))
            @if let Some(message) = error {
                p class="mt-6 text-red-700" { (message) }
            } @else if query.chars().count() >= 2 && results.is_empty() {
                p class="mt-6 text-gray-500" { "No results." }
            }
            div class="mt-8 grid gap-4 md:grid-cols-2" {
                @for result in results {
                    div class="flex gap-4 bg-white shadow rounded-lg p-4" {
                        @if let Some(url) = &result.poster_url {
                            img class="h-24 w-16 rounded object-cover" src=(url) alt="";
                        }
                        div {
                            @if result.source == CatalogSource::Tmdb {
                                a class="font-semibold text-gray-900 hover:text-blue-700" href=(format!("/titles/{}?mediaType={}", result.external_id, result.media_type)) { (result.title) }
                            } @else {
                                span class="font-semibold text-gray-900" { (result.title) }
                            }
                            @if let Some(year) = result.year {
                                span class="ml-2 text-gray-500" { "(" (year) ")" }
                            }
                            p class="text-xs uppercase text-gray-400" { (result.media_type) }
                            @if let Some(overview) = &result.overview {
                                p class="mt-1 text-sm text-gray-600 line-clamp-3" { (overview) }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn title_page(user: Option<&SessionUser>, title: &TitleView, reviews: &[ReviewView]) -> String {
    page(
        &title.title,
        user,
        html! {
            div class="flex gap-6 bg-white shadow rounded-lg p-6" {
                @if let Some(path) = &title.poster_path {
                    img class="h-64 rounded object-cover" src=(poster_url(path)) alt=(title.title);
                }
                div {
                    h1 class="text-3xl font-bold text-gray-900" { (title.title) }
                    @if let Some(original) = title.original_title.as_ref().filter(|o| **o != title.title) {
                        p class="text-gray-500" { (original) }
                    }
                    p class="mt-2 text-sm text-gray-600" {
                        (title.media_type)
                        @if let Some(date) = &title.release_date { " · " (date) }
                        @if let Some(runtime) = title.runtime_minutes { " · " (runtime) " min" }
                        @if let Some(vote) = title.vote_average { " · TMDB " (format!("{vote:.1}")) }
                    }
                    @if !title.genres.is_empty() {
                        p class="mt-2 text-sm text-gray-500" { (title.genres.join(", ")) }
                    }
                    @if let Some(overview) = &title.overview {
                        p class="mt-4 text-gray-700" { (overview) }
                    }
                    a class=(format!("mt-6 inline-block {BUTTON_CLASS}")) href=(review_href(title.source, i64::from(title.tmdb_id), title.media_type)) { "Write a review" }
                }
            }
            section class="mt-8" {
                h2 class="text-xl font-semibold text-gray-900" { "Reviews" }
                (review_list(reviews))
            }
        },
    )
}

pub fn reviews_page(user: Option<&SessionUser>, heading: &str, reviews: &[ReviewView]) -> String {
    page(
        heading,
        user,
        html! {
            h1 class="text-2xl font-bold text-gray-900" { (heading) }
            (review_list(reviews))
        },
    )
}

pub fn review_page(user: Option<&SessionUser>, review: &ReviewView) -> String {
    page(
        &review.title.title,
        user,
        html! {
            article class="bg-white shadow rounded-lg p-6" {
                a class="text-2xl font-bold text-gray-900 hover:text-blue-700" href=(title_href(&review.title)) { (review.title.title) }
                p class="mt-1 text-sm text-gray-500" {
                    @if let Some(date) = &review.watched_on { "Watched " (date) }
                    @if let Some(rating) = review.rating { " · " (stars(rating)) }
                    @if review.liked { " · ♥" }
                }
                @if review.contains_spoilers {
                    p class="mt-4 text-sm font-semibold text-amber-700" { "Contains spoilers" }
                }
                p class="mt-4 whitespace-pre-line text-gray-800" { (review.body) }
                (tag_list(&review.tags))
            }
        },
    )
}

pub fn lists_page(user: &SessionUser, lists: &[ListView], banner: Banner) -> String {
    page(
        "Lists",
        Some(user),
        html! {
            h1 class="text-2xl font-bold text-gray-900" { "Your lists" }
            (banner_box(banner))
            form class="mt-6 grid gap-4 bg-white shadow rounded-lg p-6 md:grid-cols-2" method="post" action="/lists" {
                div {
                    label class=(LABEL_CLASS) for="name" { "Name" }
                    input class=(INPUT_CLASS) name="name" id="name" required;
                }
                div {
                    label class=(LABEL_CLASS) for="privacy" { "Privacy" }
                    (privacy_select(Privacy::Public))
                }
                div class="md:col-span-2" {
                    label class=(LABEL_CLASS) for="description" { "Description" }
                    input class=(INPUT_CLASS) name="description" id="description";
                }
                div { button class=(BUTTON_CLASS) type="submit" { "Create list" } }
            }
            @if lists.is_empty() {
                p class="mt-6 text-gray-500" { "No lists yet." }
            } @else {
                ul class="mt-6 space-y-3" {
                    @for list in lists {
                        li class="bg-white shadow rounded-lg p-4" {
                            a class="font-semibold text-gray-900 hover:text-blue-700" href=(format!("/lists/{}", list.id)) { (list.name) }
                            span class="ml-2 text-xs uppercase text-gray-400" { (privacy_label(list)) }
                            a class="ml-4 text-sm text-blue-600" href=(format!("/lists/{}/edit", list.id)) { "Edit" }
                            @if let Some(description) = &list.description {
                                p class="mt-1 text-sm text-gray-600" { (description) }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn list_page(user: &SessionUser, list: &ListView, items: &[ListItemView]) -> String {
    page(
        &list.name,
        Some(user),
        html! {
            h1 class="text-2xl font-bold text-gray-900" { (list.name) }
            @if let Some(description) = &list.description {
                p class="mt-2 text-gray-600" { (description) }
            }
            a class="mt-2 inline-block text-sm text-blue-600" href=(format!("/lists/{}/edit", list.id)) { "Edit list" }
            @if items.is_empty() {
                p class="mt-6 text-gray-500" { "This list is empty." }
            } @else {
                ol class="mt-6 space-y-3" {
                    @for item in items {
                        li class="flex items-start gap-4 bg-white shadow rounded-lg p-4" {
                            span class="w-8 text-right font-mono text-gray-400" { (item.rank) }
                            div {
                                a class="font-semibold text-gray-900 hover:text-blue-700" href=(title_href(&item.title)) { (item.title.title) }
                                @if let Some(note) = &item.note {
                                    p class="mt-1 text-sm text-gray-600" { (note) }
                                }
                                @if let Some(review) = &item.latest_review {
                                    a class="mt-1 block text-xs text-blue-600" href=(format!("/reviews/{}", review.id)) {
                                        "Your review"
                                        @if let Some(rating) = review.rating { " · " (stars(rating)) }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn me_page(user: &SessionUser, stats: &DbStats, reviews: &[ReviewView]) -> String {
    page(
        "Me",
        Some(user),
        html! {
            h1 class="text-2xl font-bold text-gray-900" { (user.name.as_deref().unwrap_or(&user.email)) }
            p class="text-gray-500" { (user.email) }
            div class="mt-6 grid grid-cols-3 gap-4" {
                (stat("Titles", stats.titles.to_string()))
                (stat("Your reviews", stats.reviews.to_string()))
                (stat("Your lists", stats.lists.to_string()))
            }
            section class="mt-8" {
                h2 class="text-xl font-semibold text-gray-900" { "Your recent reviews" }
                a class="text-sm text-blue-600" href="/my-reviews" { "Manage your reviews" }
                (review_list(reviews))
            }
        },
    )
}

pub fn review_form_page(
    user: &SessionUser,
    pick: &Pick,
    title: Option<&TitleView>,
    today: &str,
    error: Option<&str>,
) -> String {
    let heading = title.map_or(pick.title.as_str(), |t| t.title.as_str());
    page(
        "Write a review",
        Some(user),
        html! {
            h1 class="text-2xl font-bold text-gray-900" { "I have watched..." }
            (banner_box(Banner { notice: None, error }))
            div class="mt-6 flex gap-6 bg-white shadow rounded-lg p-6" {
                @if let Some(path) = title.and_then(|t| t.poster_path.as_ref()) {
                    img class="h-48 rounded object-cover" src=(poster_url(path)) alt=(heading);
                }
                div {
                    h2 class="text-xl font-semibold text-gray-900" { (heading) }
                    p class="text-sm text-gray-500" {
                        (pick.media_type)
                        @if let Some(date) = title.and_then(|t| t.release_date.as_ref()) { " · " (date) }
                    }
                }
            }
            form class="mt-6 space-y-4 bg-white shadow rounded-lg p-6" method="post" action=(format!("/review/{}", pick.external_id)) {
                input type="hidden" name="source" value=(pick.source.as_str());
                input type="hidden" name="mediaType" value=(pick.media_type.as_str());
                div class="grid gap-4 md:grid-cols-2" {
                    div {
                        label class=(LABEL_CLASS) for="watchedOn" { "Date watched" }
                        input class=(INPUT_CLASS) type="date" name="watchedOn" id="watchedOn" value=(today);
                    }
                    div {
                        label class=(LABEL_CLASS) for="rating" { "Rating" }
                        (rating_select())
                    }
                }
                div class="flex gap-6 text-sm text-gray-700" {
                    label { input type="checkbox" name="liked"; " Like this film" }
                    label { input type="checkbox" name="containsSpoilers"; " Contains spoilers" }
                }
                div {
                    label class=(LABEL_CLASS) for="body" { "Review" }
                    textarea class=(INPUT_CLASS) name="body" id="body" rows="8" required {}
                }
                div {
                    label class=(LABEL_CLASS) for="tags" { "Tags" }
                    input class=(INPUT_CLASS) name="tags" id="tags" placeholder="comma separated";
                }
                button class=(BUTTON_CLASS) type="submit" { "Save review" }
            }
        },
    )
}

pub fn track_page(
    user: &SessionUser,
    search: CatalogSearch,
    pick: Option<&Pick>,
    today: &str,
    banner: Banner,
) -> String {
    page(
        "Track",
        Some(user),
        html! {
            h1 class="text-2xl font-bold text-gray-900" { "Log a film" }
            (banner_box(banner))
            @if let Some(pick) = pick {
                form class="mt-6 space-y-4 bg-white shadow rounded-lg p-6" method="post" action="/track" {
                    h2 class="text-xl font-semibold text-gray-900" { (pick.title) }
                    (pick_fields(pick.source, pick.external_id, pick.media_type))
                    div class="grid gap-4 md:grid-cols-2" {
                        div {
                            label class=(LABEL_CLASS) for="watchedOn" { "Date watched" }
                            input class=(INPUT_CLASS) type="date" name="watchedOn" id="watchedOn" value=(today) required;
                        }
                        div {
                            label class=(LABEL_CLASS) for="rating" { "Rating" }
                            (rating_select())
                        }
                    }
                    div class="flex gap-6 text-sm text-gray-700" {
                        label { input type="checkbox" name="liked"; " Liked" }
                        label { input type="checkbox" name="rewatch"; " Rewatch" }
                    }
                    div {
                        label class=(LABEL_CLASS) for="notes" { "Notes" }
                        textarea class=(INPUT_CLASS) name="notes" id="notes" rows="3" {}
                    }
                    button class=(BUTTON_CLASS) type="submit" { "Log" }
                    a class="ml-4 text-sm text-gray-600" href="/track" { "Cancel" }
                }
            }
            (catalog_picker("/track", search, |result| html! {
                a class="text-sm text-blue-600" href=(track_href(result)) { "Log" }
                " · "
                a class="text-sm text-blue-600" href=(review_href(result.source, result.external_id, result.media_type)) { "Review" }
            }))
        },
    )
}

pub fn list_edit_page(
    user: &SessionUser,
    list: &ListView,
    items: &[ListItemView],
    search: CatalogSearch,
    banner: Banner,
) -> String {
    let base = format!("/lists/{}", list.id);
    page(
        &list.name,
        Some(user),
        html! {
            h1 class="text-2xl font-bold text-gray-900" { "Edit " (list.name) }
            a class="text-sm text-blue-600" href=(base) { "View list" }
            (banner_box(banner))

            form class="mt-6 grid gap-4 bg-white shadow rounded-lg p-6 md:grid-cols-2" method="post" action=(format!("{base}/edit")) {
                div {
                    label class=(LABEL_CLASS) for="name" { "Name" }
                    input class=(INPUT_CLASS) name="name" id="name" value=(list.name) required;
                }
                div {
                    label class=(LABEL_CLASS) for="privacy" { "Privacy" }
                    (privacy_select(list.privacy))
                }
                div class="md:col-span-2" {
                    label class=(LABEL_CLASS) for="description" { "Description" }
                    input class=(INPUT_CLASS) name="description" id="description" value=(list.description.as_deref().unwrap_or_default());
                }
                div { button class=(BUTTON_CLASS) type="submit" { "Save details" } }
            }

            section class="mt-8" {
                h2 class="text-xl font-semibold text-gray-900" { "Items" }
                @if items.is_empty() {
                    p class="mt-4 text-gray-500" { "This list is empty. Add titles from the search below." }
                } @else {
                    form id="reorder" method="post" action=(format!("{base}/items/order")) {}
                    ol class="mt-4 space-y-3" {
                        @for item in items {
                            li class="bg-white shadow rounded-lg p-4" {
                                div class="flex items-center gap-4" {
                                    input class="w-20 rounded-md border border-gray-300 px-2 py-1" type="number" min="1" max="10000"
                                        form="reorder" name=(format!("rank:{}", item.id)) value=(item.rank) aria-label="Rank";
                                    a class="flex-1 font-semibold text-gray-900 hover:text-blue-700" href=(title_href(&item.title)) { (item.title.title) }
                                    form method="post" action=(format!("{base}/items/{}/delete", item.id)) {
                                        button class=(DANGER_BUTTON_CLASS) type="submit" { "Remove" }
                                    }
                                }
                                form class="mt-3 flex gap-3" method="post" action=(format!("{base}/items/{}/note", item.id)) {
                                    input class="flex-1 rounded-md border border-gray-300 px-3 py-1 text-sm" name="note" maxlength="500"
                                        placeholder="Note" value=(item.note.as_deref().unwrap_or_default());
                                    button class=(SMALL_BUTTON_CLASS) type="submit" { "Save note" }
                                }
                            }
                        }
                    }
                    button class=(format!("mt-4 {BUTTON_CLASS}")) type="submit" form="reorder" { "Save order" }
                }
            }

            section class="mt-10" {
                h2 class="text-xl font-semibold text-gray-900" { "Add titles" }
                (catalog_picker(&format!("{base}/edit"), search, |result| html! {
                    form method="post" action=(format!("{base}/items")) {
                        (pick_fields(result.source, result.external_id, result.media_type))
                        button class=(SMALL_BUTTON_CLASS) type="submit" { "Add" }
                    }
                }))
            }

            form class="mt-10" method="post" action=(format!("{base}/delete")) {
                button class=(DANGER_BUTTON_CLASS) type="submit" { "Delete list" }
            }
        },
    )
}

pub fn to_watch_page(
    user: &SessionUser,
    list: Option<&ListView>,
    items: &[ListItemView],
    search: CatalogSearch,
    banner: Banner,
) -> String {
    page(
        "To watch",
        Some(user),
        html! {
            h1 class="text-2xl font-bold text-gray-900" { "To watch" }
            p class="text-gray-500" { "Build a Watch Later list from catalog search results." }
            (banner_box(banner))
            @match list {
                Some(list) => {
                    p class="mt-4 text-sm text-gray-600" {
                        (items.len()) " in "
                        a class="text-blue-600" href=(format!("/lists/{}/edit", list.id)) { (list.name) }
                    }
                    @if !items.is_empty() {
                        ol class="mt-4 space-y-2" {
                            @for item in items {
                                li class="bg-white shadow rounded-lg px-4 py-2" {
                                    a class="font-medium text-gray-900 hover:text-blue-700" href=(title_href(&item.title)) { (item.title.title) }
                                }
                            }
                        }
                    }
                },
                None => {
                    p class="mt-4 text-sm text-gray-600" { "Watch Later list: not created yet." }
                },
            }
            (catalog_picker("/to-watch", search, |result| html! {
                form method="post" action="/to-watch" {
                    (pick_fields(result.source, result.external_id, result.media_type))
                    button class=(SMALL_BUTTON_CLASS) type="submit" { "Watch later" }
                }
            }))
        },
    )
}

pub fn my_reviews_page(user: &SessionUser, reviews: &[ReviewView], banner: Banner) -> String {
    page(
        "My reviews",
        Some(user),
        html! {
            h1 class="text-2xl font-bold text-gray-900" { "My reviews" }
            (banner_box(banner))
            @if reviews.is_empty() {
                p class="mt-6 text-gray-500" { "You have not written any reviews yet." }
            } @else {
                form class="mt-6" method="post" action="/my-reviews/delete" {
                    ul class="space-y-3" {
                        @for review in reviews {
                            li class="flex items-start gap-4 bg-white shadow rounded-lg p-4" {
                                input class="mt-1" type="checkbox" name="id" value=(review.id) aria-label="Select review";
                                div {
                                    a class="font-semibold text-gray-900 hover:text-blue-700" href=(format!("/reviews/{}", review.id)) { (review.title.title) }
                                    @if let Some(rating) = review.rating {
                                        span class="ml-2 text-sm text-gray-600" { (stars(rating)) }
                                    }
                                    p class="mt-1 text-sm text-gray-700 line-clamp-2" { (review.body) }
                                }
                            }
                        }
                    }
                    button class=(format!("mt-4 {DANGER_BUTTON_CLASS}")) type="submit" { "Delete selected" }
                }
            }
        },
    )
}

pub fn sign_in_page(error: Option<&str>, next: &str) -> String {
    let message = match error {
        Some("invalid") => Some("Email or password is incorrect."),
        Some("exists") => Some("That email already has an account. Sign in instead."),
        Some(_) => Some("Something went wrong. Try again."),
        None => None,
    };
    auth_page("Sign in", "/api/auth/sign-in", message, next, false)
}

pub fn sign_up_page(error: Option<&str>, next: &str) -> String {
    let message = error.map(|_| "Something went wrong. Try again.");
    auth_page("Sign up", "/api/auth/sign-up", message, next, true)
}

pub fn unlock_page(failed: bool, next: &str) -> String {
    page(
        "Admin unlock",
        None,
        html! {
            div class="max-w-md mx-auto bg-white shadow rounded-lg p-8" {
                h1 class="text-2xl font-bold text-gray-900" { "Admin unlock" }
                @if failed {
                    p class="mt-4 text-red-700" { "Wrong passphrase." }
                }
                form class="mt-6 space-y-4" method="post" action="/api/admin/unlock" {
                    input type="hidden" name="next" value=(next);
                    label class="block text-sm font-medium text-gray-700" for="passphrase" { "Passphrase" }
                    input class=(INPUT_CLASS) type="password" name="passphrase" id="passphrase" required;
                    button class=(BUTTON_CLASS) type="submit" { "Unlock" }
                }
            }
        },
    )
}

pub fn error_page(message: &str) -> String {
    page(
        "Error",
        None,
        html! {
            div class="max-w-xl mx-auto bg-white shadow rounded-lg p-8" {
                h1 class="text-2xl font-bold text-gray-900" { "Error" }
                p class="mt-4 text-gray-700" { (message) }
                a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Back" }
            }
        },
    )
}

fn page(title: &str, user: Option<&SessionUser>, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " · Movieboxd" }
                script src=(TAILWIND_CDN) {}
            }
            body class="min-h-screen bg-gray-50" {
                nav class="bg-white shadow" {
                    div class="max-w-4xl mx-auto flex items-center gap-6 px-6 py-3 text-sm" {
                        a class="font-bold text-gray-900" href="/" { "Movieboxd" }
                        a class="text-gray-600 hover:text-gray-900" href="/search" { "Search" }
                        a class="text-gray-600 hover:text-gray-900" href="/reviews" { "Reviews" }
                        a class="text-gray-600 hover:text-gray-900" href="/lists" { "Lists" }
                        @if user.is_some() {
                            a class="text-gray-600 hover:text-gray-900" href="/track" { "Track" }
                            a class="text-gray-600 hover:text-gray-900" href="/to-watch" { "To watch" }
                        }
                        span class="flex-1" {}
                        @if let Some(user) = user {
                            a class="text-gray-600 hover:text-gray-900" href="/me" { (user.name.as_deref().unwrap_or(&user.email)) }
                            a class="text-gray-600 hover:text-gray-900" href="/sign-out" { "Sign out" }
                        } @else {
                            a class="text-gray-600 hover:text-gray-900" href="/sign-in" { "Sign in" }
                        }
                    }
                }
                main class="max-w-4xl mx-auto px-6 py-10" { (body) }
            }
        }
    }
    .into_string()
}

fn auth_page(heading: &str, action: &str, error: Option<&str>, next: &str, with_name: bool) -> String {
    page(
        heading,
        None,
        html! {
            div class="max-w-md mx-auto bg-white shadow rounded-lg p-8" {
                h1 class="text-2xl font-bold text-gray-900" { (heading) }
                @if let Some(message) = error {
                    p class="mt-4 text-red-700" { (message) }
                }
                form class="mt-6 space-y-4" method="post" action=(action) {
                    input type="hidden" name="next" value=(next);
                    @if with_name {
                        div {
                            label class="block text-sm font-medium text-gray-700" for="name" { "Name" }
                            input class=(INPUT_CLASS) name="name" id="name";
                        }
                    }
                    div {
                        label class="block text-sm font-medium text-gray-700" for="email" { "Email" }
                        input class=(INPUT_CLASS) type="email" name="email" id="email" required;
                    }
                    div {
                        label class="block text-sm font-medium text-gray-700" for="password" { "Password" }
                        input class=(INPUT_CLASS) type="password" name="password" id="password" required;
                    }
                    button class=(BUTTON_CLASS) type="submit" { (heading) }
                }
                @if with_name {
                    a class="mt-4 block text-sm text-blue-600" href="/sign-in" { "Have an account? Sign in" }
                } @else {
                    a class="mt-4 block text-sm text-blue-600" href="/sign-up" { "New here? Sign up" }
                }
            }
        },
    )
}

fn search_form(query: &str, kind: SearchType) -> Markup {
    html! {
        form class="flex gap-3" method="get" action="/search" {
            input class=(INPUT_CLASS) name="q" value=(query) placeholder="Search movies and shows" minlength="2" required;
            select class="mt-2 rounded-md border border-gray-300 px-2" name="type" {
                @for choice in [SearchType::Multi, SearchType::Movie, SearchType::Tv] {
                    option value=(choice.as_str()) selected[choice == kind] { (choice.as_str()) }
                }
            }
            button class=(BUTTON_CLASS) type="submit" { "Search" }
        }
    }
}

fn review_list(reviews: &[ReviewView]) -> Markup {
    html! {
        @if reviews.is_empty() {
            p class="mt-4 text-gray-500" { "No reviews yet." }
        } @else {
            ul class="mt-4 space-y-3" {
                @for review in reviews {
                    li class="bg-white shadow rounded-lg p-4" {
                        a class="font-semibold text-gray-900 hover:text-blue-700" href=(format!("/reviews/{}", review.id)) { (review.title.title) }
                        @if let Some(rating) = review.rating {
                            span class="ml-2 text-sm text-gray-600" { (stars(rating)) }
                        }
                        @if review.contains_spoilers {
                            p class="mt-1 text-sm italic text-amber-700" { "Spoilers hidden" }
                        } @else {
                            p class="mt-1 text-sm text-gray-700 line-clamp-3" { (review.body) }
                        }
                        (tag_list(&review.tags))
                    }
                }
            }
        }
    }
}

fn tag_list(tags: &[String]) -> Markup {
    html! {
        @if !tags.is_empty() {
            div class="mt-2 flex flex-wrap gap-2" {
                @for tag in tags {
                    span class="rounded bg-gray-100 px-2 py-0.5 text-xs text-gray-600" { "#" (tag) }
                }
            }
        }
    }
}

fn banner_box(banner: Banner) -> Markup {
    html! {
        @if let Some(notice) = banner.notice {
            p class="mt-4 rounded-md bg-green-50 px-4 py-2 text-green-800" { (notice) }
        }
        @if let Some(error) = banner.error {
            p class="mt-4 rounded-md bg-red-50 px-4 py-2 text-red-800" { (error) }
        }
    }
}

/// Search box that reloads `path`, followed by the hits, each with `action` beside it.
fn catalog_picker(path: &str, search: CatalogSearch, action: impl Fn(&CatalogResult) -> Markup) -> Markup {
    html! {
        form class="mt-8 flex gap-3" method="get" action=(path) {
            input class=(INPUT_CLASS) name="q" value=(search.query) placeholder="Search movies and shows" minlength="2" required;
            select class="mt-2 rounded-md border border-gray-300 px-2" name="type" {
                @for choice in [SearchType::Movie, SearchType::Tv, SearchType::Multi] {
                    option value=(choice.as_str()) selected[choice == search.kind] { (choice.as_str()) }
                }
            }
            button class=(BUTTON_CLASS) type="submit" { "Search" }
        }
        @if let Some(message) = search.error {
            p class="mt-4 text-red-700" { (message) }
        } @else if search.query.chars().count() >= 2 && search.results.is_empty() {
            p class="mt-4 text-gray-500" { "No results found. Try another title or adjust the type filter." }
        }
        ul class="mt-4 space-y-2" {
            @for result in search.results {
                li class="flex items-center gap-4 bg-white shadow rounded-lg p-3" {
                    @if let Some(url) = &result.poster_url {
                        img class="h-12 w-9 rounded object-cover" src=(url) alt="";
                    }
                    div class="flex-1" {
                        span class="font-semibold text-gray-900" { (result.title) }
                        span class="ml-2 text-xs uppercase text-gray-400" {
                            (result.media_type)
                            @if let Some(year) = result.year { " · " (year) }
                        }
                    }
                    (action(result))
                }
            }
        }
    }
}

fn pick_fields(source: CatalogSource, external_id: i64, media_type: MediaType) -> Markup {
    html! {
        input type="hidden" name="source" value=(source.as_str());
        input type="hidden" name="externalId" value=(external_id);
        input type="hidden" name="mediaType" value=(media_type.as_str());
    }
}

fn rating_select() -> Markup {
    html! {
        select class=(INPUT_CLASS) name="rating" id="rating" {
            option value="" { "No rating" }
            @for halves in 1..=10u8 {
                @let rating = f64::from(halves) / 2.0;
                option value=(format!("{rating:.1}")) { (stars(rating)) }
            }
        }
    }
}

fn privacy_select(current: Privacy) -> Markup {
    html! {
        select class=(INPUT_CLASS) name="privacy" id="privacy" {
            @for (choice, label) in [(Privacy::Public, "public"), (Privacy::Private, "private"), (Privacy::Friends, "friends")] {
                option value=(label) selected[choice == current] { (label) }
            }
        }
    }
}

fn review_href(source: CatalogSource, external_id: i64, media_type: MediaType) -> String {
    format!("/review/{external_id}?mediaType={media_type}&source={}", source.as_str())
}

fn track_href(result: &CatalogResult) -> String {
    format!(
        "/track?source={}&externalId={}&mediaType={}&title={}",
        result.source.as_str(),
        result.external_id,
        result.media_type,
        urlencoding::encode(&result.title)
    )
}

fn stat(label: &str, value: String) -> Markup {
    html! {
        div class="bg-white shadow rounded-lg p-4" {
            p class="text-xs uppercase text-gray-500" { (label) }
            p class="mt-1 text-2xl font-semibold text-gray-900" { (value) }
        }
    }
}

fn title_href(title: &TitleSummary) -> String {
    format!("/titles/{}?mediaType={}", title.tmdb_id, title.media_type)
}

fn privacy_label(list: &ListView) -> &'static str {
    match list.privacy {
        Privacy::Public => "public",
        Privacy::Private => "private",
        Privacy::Friends => "friends",
    }
}

/// TVmaze posters are stored as absolute URLs, TMDB ones as paths.
fn poster_url(path: &str) -> String {
    if path.starts_with("http") { path.to_string() } else { format!("{TMDB_POSTER_BASE}{path}") }
}

/// Half-star ratings rendered as `★★★½`.
fn stars(rating: f64) -> String {
    let halves = (rating * 2.0).round().clamp(0.0, 10.0) as usize;
    let mut out = "★".repeat(halves / 2);
    if halves % 2 == 1 {
        out.push('½');
    }
    if out.is_empty() { "0".to_string() } else { out }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_round_to_halves() {
        assert_eq!(stars(3.5), "★★★½");
        assert_eq!(stars(4.74), "★★★★½");
        assert_eq!(stars(5.0), "★★★★★");
        assert_eq!(stars(0.0), "0");
    }

    #[test]
    fn poster_urls_resolve_tmdb_paths() {
        assert_eq!(poster_url("/x.jpg"), "https://image.tmdb.org/t/p/w342/x.jpg");
        assert_eq!(poster_url("https://static.tvmaze.com/a.jpg"), "https://static.tvmaze.com/a.jpg");
    }

    #[test]
    fn track_links_carry_the_pick() {
        let result = CatalogResult {
            source: CatalogSource::Tvmaze,
            media_type: MediaType::Tv,
            external_id: 82,
            title: "Game of Thrones".into(),
            year: Some(2011),
            overview: None,
            poster_url: None,
            backdrop_url: None,
        };
        assert_eq!(
            track_href(&result),
            "/track?source=tvmaze&externalId=82&mediaType=tv&title=Game%20of%20Thrones"
        );
        assert_eq!(review_href(result.source, 82, result.media_type), "/review/82?mediaType=tv&source=tvmaze");
    }

    #[test]
    fn rating_choices_step_by_half_stars() {
        let html = rating_select().into_string();
        assert!(html.contains(r#"value="0.5""#));
        assert!(html.contains(r#"value="5.0""#));
        assert!(!html.contains(r#"value="5.5""#));
    }

    #[test]
    fn sign_in_page_shows_error_and_escapes_next() {
        let html = sign_in_page(Some("invalid"), "/lists?x=\"><script>");
        assert!(html.contains("Email or password is incorrect."));
        assert!(!html.contains("<script>"));
    }
}
