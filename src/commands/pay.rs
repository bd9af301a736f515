use crate::accounting::open_invoice;
use crate::args::PayArgs;
use crate::commands::{load_store, Out};
use crate::model::Amount;
use crate::store::Persistence;
use crate::{Config, Result};
use serde::Serialize;

/// What a `pay` invocation did.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    pub card_id: String,
    pub amount: Amount,
    pub confirmed: bool,
}

/// Pays a card's open invoice. The card is resolved by keyword the same way
/// the assistant resolves it: first name match, case-insensitive.
pub async fn pay(config: Config, args: PayArgs) -> Result<Out<PaymentOutcome>> {
    let mut store = load_store(&config).await?;

    let Some(card) = store.find_card(args.card()) else {
        return Ok(Out::new_message(format!(
            "No card matches '{}'",
            args.card()
        )));
    };
    let (card_id, card_name) = (card.id.clone(), card.name.clone());

    let invoice = open_invoice(&card_id, store.transactions());
    if !invoice.is_positive() {
        return Ok(Out::new_message(format!(
            "{card_name} has no open invoice"
        )));
    }

    let persistence = store.pay_card_invoice(&card_id).await?;
    let message = match &persistence {
        Persistence::Confirmed => format!("Paid the {card_name} invoice of {invoice}"),
        Persistence::LocalOnly(warning) => format!(
            "Paid the {card_name} invoice of {invoice} locally, but the remote write failed: \
             {warning}"
        ),
    };
    Ok(Out::new(
        message,
        PaymentOutcome {
            card_id,
            amount: invoice,
            confirmed: persistence.is_confirmed(),
        },
    ))
}
