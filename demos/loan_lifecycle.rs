/// lifecycle - a participant loan from creation to the final installment
use chit_loan_rs::chrono::{Duration, NaiveDate, TimeZone, Utc};
use chit_loan_rs::{
    InMemoryLoanStore, LoanService, LoanTerms, LoanView, Money, Rate, SafeTimeProvider,
    ServiceConfig, TermsEdit, TimeSource,
};
use simple_logger::SimpleLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    SimpleLogger::new().with_level(log::LevelFilter::Info).init()?;

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();
    let service = LoanService::new(InMemoryLoanStore::new(), ServiceConfig::default());

    // 1. preview while the admin fills in the form
    let terms = LoanTerms::new(
        Money::from_major(12_000),
        Rate::from_percentage(12),
        12,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    );
    let quote = service.preview(&terms)?;
    println!("preview: {} x 12 = {}", quote.installment_amount, quote.total_amount);

    // 2. create the loan
    let loan = service.create_loan("member-42", &terms, &time)?;

    // 3. six monthly installments
    for _ in 0..6 {
        controller.advance(Duration::days(30));
        service.record_payment(loan.id(), &time)?;
    }

    // 4. admin shortens the term to 8 installments
    service.edit_terms(loan.id(), &TermsEdit::default().installments(8), &time)?;

    // 5. pay it off
    loop {
        controller.advance(Duration::days(30));
        let loan = service.record_payment(loan.id(), &time)?;
        if loan.status().is_terminal() {
            break;
        }
    }

    let view: LoanView = service.loan_view(loan.id())?;
    println!("{}", view.to_json_pretty()?);

    for event in service.take_events() {
        println!("{:?}", event);
    }

    Ok(())
}
