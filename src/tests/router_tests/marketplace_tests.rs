use crate::tests::utils::{body_json, get, test_app};

#[test]
fn land_lists_only_listed_land_with_option_sets() {
    let app = test_app();

    let resp = get(&app, "/land");
    assert_eq!(resp.status(), 200);

    let body = body_json(resp);
    let land = body["land"].as_array().unwrap();
    // two listed land parcels; the draft stays hidden
    assert_eq!(land.len(), 2);

    let options = &body["options"];
    assert!(options["classifications"]
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c == "RA"));
    assert!(options["governorates"]
        .as_array()
        .unwrap()
        .iter()
        .any(|g| g == "Northern"));
    assert!(options["locations"]
        .as_array()
        .unwrap()
        .iter()
        .any(|l| l == "BU QUWAH"));
}

#[test]
fn land_joins_registry_attributes_onto_listings() {
    let app = test_app();

    let body = body_json(get(&app, "/land?location=BU%20QUWAH"));
    let land = body["land"].as_array().unwrap();
    assert_eq!(land.len(), 1);
    assert_eq!(land[0]["parcel_no"], "03020551");
    assert_eq!(land[0]["shape_area"], 450.5);
    assert_eq!(land[0]["governorate"], "Northern");
}

#[test]
fn land_price_range_filters_apply() {
    let app = test_app();

    let body = body_json(get(&app, "/land?minPrice=100000"));
    let land = body["land"].as_array().unwrap();
    assert_eq!(land.len(), 1);
    assert_eq!(land[0]["asking_price"], 120000.0);
}

#[test]
fn land_sorts_by_price_when_asked() {
    let app = test_app();

    let body = body_json(get(&app, "/land?sort=asc"));
    let prices: Vec<f64> = body["land"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["asking_price"].as_f64().unwrap())
        .collect();
    assert_eq!(prices, vec![95000.0, 120000.0]);

    let body = body_json(get(&app, "/land?sort=desc"));
    let prices: Vec<f64> = body["land"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["asking_price"].as_f64().unwrap())
        .collect();
    assert_eq!(prices, vec![120000.0, 95000.0]);
}

#[test]
fn land_defaults_to_newest_updated_first() {
    let app = test_app();

    let body = body_json(get(&app, "/land"));
    let ids: Vec<i64> = body["land"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_i64().unwrap())
        .collect();
    // listing 11 was updated after listing 10
    assert_eq!(ids, vec![11, 10]);
}

#[test]
fn residential_lists_available_apartments_and_houses() {
    let app = test_app();

    let resp = get(&app, "/marketplace/residential");
    assert_eq!(resp.status(), 200);

    let body = body_json(resp);
    let listings = body["listings"].as_array().unwrap();
    assert_eq!(listings.len(), 2);

    let options = &body["options"];
    assert_eq!(options["bedrooms"].as_array().unwrap(), &vec![2, 4]);
    assert!(options["locations"]
        .as_array()
        .unwrap()
        .iter()
        .any(|l| l == "JUFFAIR"));
}

#[test]
fn residential_bedroom_and_type_filters_apply() {
    let app = test_app();

    let body = body_json(get(&app, "/marketplace/residential?bedrooms=2"));
    let listings = body["listings"].as_array().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0]["property_type"], "apartment");

    let body = body_json(get(&app, "/marketplace/residential?type=house"));
    let listings = body["listings"].as_array().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0]["title"], "Saar family villa");
}

#[test]
fn residential_price_filter_coalesces_sale_and_rent() {
    let app = test_app();

    // maxPrice=1000 keeps only the 550/mo rental
    let body = body_json(get(&app, "/marketplace/residential?maxPrice=1000"));
    let listings = body["listings"].as_array().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0]["rent_price"], 550.0);
}

#[test]
fn firms_catalogue_counts_available_listings() {
    let app = test_app();

    let resp = get(&app, "/marketplace/firms");
    assert_eq!(resp.status(), 200);

    let body = body_json(resp);
    let firms = body["firms"].as_array().unwrap();
    assert_eq!(firms.len(), 2);

    // alphabetical: Gulf Estates then Manama Realty, one available each
    assert_eq!(firms[0]["firm_name"], "Gulf Estates");
    assert_eq!(firms[0]["listings_count"], 1);
    assert_eq!(firms[1]["firm_name"], "Manama Realty");
    assert_eq!(firms[1]["listings_count"], 1);
    assert_eq!(firms[1]["logo_url"], "https://cdn.example/manama.png");
}
