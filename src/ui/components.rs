/// Tab contents: Info, Document and Version
use std::collections::HashSet;

use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::bridge::{self, Manifest, Permissions};
use crate::docs::{
    DOCUMENT_CLASS_MAP, DocBundle, DocItem, VERSION_CLASS_MAP, apply_class_map, format_release_date, version_badge,
    version_of, visible_documents, visible_versions,
};
use crate::info::{ExtensionMetadata, SiteAccess, extensions_page_url, store_url};

// HTML in the bundle was sanitized when it was generated
fn trusted_html(html: String) -> Html {
    Html::from_html_unchecked(AttrValue::from(html))
}

/// Anchor that opens in a new browser tab (also works for chrome:// pages)
fn tab_link(url: String, text: String) -> Html {
    let onclick = {
        let url = url.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            bridge::open_tab(&url);
        })
    };

    html! {
        <a href={url} {onclick}>{text}</a>
    }
}

/// Ids of documents whose metadata asks for them to start open
fn initially_expanded(docs: &[DocItem]) -> HashSet<String> {
    docs.iter()
        .filter(|doc| doc.metadata.expanded)
        .map(|doc| doc.metadata.id.clone())
        .collect()
}

#[function_component(DocumentTab)]
pub fn document_tab() -> Html {
    let docs = use_memo((), |_| visible_documents(&DocBundle::embedded().documents));
    let expanded = use_state(|| initially_expanded(&docs));

    let on_toggle = {
        let expanded = expanded.clone();
        move |id: String| {
            let expanded = expanded.clone();
            Callback::from(move |_: MouseEvent| {
                let mut next = (*expanded).clone();
                if !next.remove(&id) {
                    next.insert(id.clone());
                }
                expanded.set(next);
            })
        }
    };

    if docs.is_empty() {
        return html! {
            <p class="text-center text-muted mt-5">{"No documents yet"}</p>
        };
    }

    html! {
        <div class="accordion" id="accordion">
            {for docs.iter().map(|doc| {
                let id = doc.metadata.id.clone();
                let is_open = expanded.contains(&id);
                html! {
                    <div class="accordion-item" key={id.clone()}>
                        <h2 class="accordion-header">
                            <button
                                class={classes!("accordion-button", (!is_open).then_some("collapsed"))}
                                type="button"
                                aria-expanded={is_open.to_string()}
                                aria-controls={format!("doc-{}", id)}
                                onclick={on_toggle(id.clone())}
                            >
                                {&doc.metadata.title}
                            </button>
                        </h2>
                        if is_open {
                            <div id={format!("doc-{}", id)} class="accordion-collapse">
                                <div class="accordion-body p-3">
                                    {trusted_html(apply_class_map(&doc.content, &DOCUMENT_CLASS_MAP))}
                                </div>
                            </div>
                        }
                    </div>
                }
            })}
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct VersionTabProps {
    pub current_version: String,
}

#[function_component(VersionTab)]
pub fn version_tab(props: &VersionTabProps) -> Html {
    let versions = use_memo((), |_| visible_versions(&DocBundle::embedded().versions));

    if versions.is_empty() {
        return html! {
            <p class="text-center text-muted mt-5">{"No release history yet"}</p>
        };
    }

    html! {
        <ul class="list-group list-group-flush">
            <h5 class="pt-3 ps-2 mb-2">{"Release history"}</h5>
            {for versions.iter().enumerate().map(|(index, item)| {
                let badge = version_badge(version_of(&item.metadata), &props.current_version, index == 0);
                let date = format_release_date(&item.metadata.date);
                html! {
                    <li class="list-group-item">
                        <div class="d-flex align-items-center gap-2 flex-wrap mb-1">
                            <strong>{&item.metadata.title}</strong>
                            if let Some(badge) = badge {
                                <span class={badge.class()}>{badge.label()}</span>
                            }
                        </div>
                        if !date.is_empty() {
                            <p class="small text-muted mb-2">{date}</p>
                        }
                        <div class="version-body">
                            {trusted_html(apply_class_map(&item.content, &VERSION_CLASS_MAP))}
                        </div>
                    </li>
                }
            })}
        </ul>
    }
}

#[derive(Properties, PartialEq)]
pub struct InfoTabProps {
    pub manifest: Manifest,
    pub metadata: ExtensionMetadata,
}

#[function_component(InfoTab)]
pub fn info_tab(props: &InfoTabProps) -> Html {
    let extension_id = use_memo((), |_| bridge::extension_id());
    let permissions = use_state(|| None::<Permissions>);
    let incognito = use_state(|| None::<bool>);

    // Query host permissions on mount
    {
        let permissions = permissions.clone();
        let incognito = incognito.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match bridge::permissions().await {
                    Ok(result) => permissions.set(Some(result)),
                    Err(e) => log::warn!("{}", e),
                }
                match bridge::incognito_access().await {
                    Ok(allowed) => incognito.set(Some(allowed)),
                    Err(e) => log::warn!("{}", e),
                }
            });
            || ()
        });
    }

    let metadata = &props.metadata;
    let site_access = (*permissions)
        .as_ref()
        .map(|p| SiteAccess::from_origins(p.origins.as_deref()));

    html! {
        <dl class="info-list small p-2">
            <dt>{"Name"}</dt>
            <dd id="extension-name">{&props.manifest.name}</dd>

            <dt>{"Version"}</dt>
            <dd id="extension-version">{&props.manifest.version}</dd>

            <dt>{"Description"}</dt>
            <dd id="extension-description">{props.manifest.description.clone().unwrap_or_default()}</dd>

            <dt>{"ID"}</dt>
            <dd id="extension-id">{extension_id.as_str()}</dd>

            <dt>{"Permissions"}</dt>
            <dd id="permission-info">
                {(*permissions).as_ref().map(|p| p.permissions.join(", ")).unwrap_or_default()}
            </dd>

            <dt>{"Site access"}</dt>
            <dd id="site-access">
                if let Some(access) = site_access {
                    {for access.lines().into_iter().map(|line| html! { <div>{line}</div> })}
                }
            </dd>

            <dt>{"Incognito"}</dt>
            <dd id="incognito-enabled">
                {match *incognito {
                    Some(true) => "Allowed",
                    Some(false) => "Not allowed",
                    None => "",
                }}
            </dd>

            <dt>{"Languages"}</dt>
            <dd id="language">{metadata.language_names()}</dd>

            <dt>{"Publisher"}</dt>
            <dd id="publisher-name">{metadata.publisher_name()}</dd>

            <dt>{"Developer"}</dt>
            <dd id="developer-name">{metadata.developer_name()}</dd>

            <dt>{"Links"}</dt>
            <dd class="d-flex flex-column">
                {tab_link(store_url(&extension_id), "Chrome Web Store".to_string())}
                {tab_link(extensions_page_url(&extension_id), "Extension settings".to_string())}
                if let Some(url) = metadata.issues_link() {
                    {tab_link(url, "Report an issue".to_string())}
                }
                if let Some(url) = metadata.github_link() {
                    {tab_link(url.clone(), url)}
                }
            </dd>
        </dl>
    }
}
