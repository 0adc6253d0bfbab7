#![cfg(all(target_arch = "wasm32", feature = "web"))]
use poltergeist::{prelude::*, web::document};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn container(id: &str) -> web_sys::Element {
    let el = document().create_element("div").unwrap();
    el.set_id(id);
    document().body().unwrap().append_child(&el).unwrap();
    el
}

#[wasm_bindgen_test]
async fn waits_for_an_element_added_later() {
    let _ = poltergeist::web::init_logging(log::Level::Trace);
    let spook = Poltergeist::browser().with_config(Config {
        poll: PollOptions::new(2000, 50),
        ..Default::default()
    });
    let parent = container("waits_for_an_element_added_later");

    let _ = spook.timer().after(120, move || {
        parent.set_inner_html(r#"<p class="late">hello</p>"#);
    });

    let found = spook.wait_for_element("#waits_for_an_element_added_later p.late").await;
    let p = found.unwrap().unwrap();
    assert_eq!(p.text_content().as_deref(), Some("hello"));
}

#[wasm_bindgen_test]
async fn times_out_on_a_missing_element() {
    let spook = Poltergeist::browser().with_config(Config {
        poll: PollOptions::new(150, 50),
        ..Default::default()
    });
    let start = spook.timer().now();
    let err = spook.wait_for_element("#never-there").await.unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
    assert!(spook.timer().now() - start >= 150.0);
    assert_eq!(spook.get_element("#never-there").unwrap(), None);
    assert!(spook.get_all_elements("#never-there").unwrap().is_empty());
}

#[wasm_bindgen_test]
async fn click_resolves_before_the_click_lands() {
    let spook = Poltergeist::browser();
    let button = container("click_resolves_before_the_click_lands");
    let clicked_at = std::rc::Rc::new(std::cell::Cell::new(None::<f64>));
    button.observe_once(EventKind::Click, {
        let clicked_at = clicked_at.clone();
        let timer = *spook.timer();
        move || clicked_at.set(Some(timer.now()))
    })
    .unwrap();

    spook.click_it(Some(&button)).await.unwrap();
    let resolved_at = spook.timer().now();
    assert!(clicked_at.get().is_none());

    spook.sleep(300).await;
    let clicked_at = clicked_at.get().expect("click never landed");
    assert!(resolved_at < clicked_at);
}

#[wasm_bindgen_test]
async fn missing_element_cannot_be_clicked() {
    let spook = Poltergeist::browser();
    let err = spook.click_it(None).await.unwrap_err();
    assert!(matches!(err, Error::ElementMissing));
}

#[wasm_bindgen_test]
async fn sleeps_at_least_as_long_as_asked() {
    let spook = Poltergeist::browser();
    let start = spook.timer().now();
    spook.sleep(40).await;
    assert!(spook.timer().now() - start >= 39.0);
}
