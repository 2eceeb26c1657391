//! GraphQL documents for the atVenu API.
//!
//! Every paginated document takes `$first: Int!` and `$cursor: String`; the
//! paginator fills both. Node lookups go through `node(uuid:)` with an inline
//! fragment, aliased to the entity name so the page path reads naturally.

/// Organization accounts. Path: `organization.accounts`.
pub const ACCOUNTS: &str = r"
query accounts($first: Int!, $cursor: String) {
  organization {
    accounts(first: $first, after: $cursor) {
      pageInfo { hasNextPage endCursor }
      nodes {
        uuid
        name
      }
    }
  }
}
";

/// The API caps `organization.accounts` pages well below other connections.
pub const ACCOUNTS_PAGE_SIZE: u32 = 20;

/// Tours of one account, optionally filtered by open/closed state.
/// Path: `account.tours`.
pub const TOURS: &str = r"
query tours($uuid: UUID!, $first: Int!, $cursor: String, $open: Boolean) {
  account: node(uuid: $uuid) {
    ... on Account {
      tours(first: $first, after: $cursor, open: $open) {
        pageInfo { hasNextPage endCursor }
        nodes {
          uuid
          name
        }
      }
    }
  }
}
";

/// Fields selected for every show, shared by both show queries.
macro_rules! show_fields {
    () => {
        r"
fragment ShowFields on Show {
  uuid
  showDate
  showEndDate
  state
  attendance
  capacity
  currencyFormat { code }
  location {
    name
    capacity
    city
    stateProvince
    country
  }
}
"
    };
}

/// Every show of one tour. Path: `tour.shows`.
pub const SHOWS: &str = concat!(
    r"
query shows($uuid: UUID!, $first: Int!, $cursor: String) {
  tour: node(uuid: $uuid) {
    ... on Tour {
      shows(first: $first, after: $cursor) {
        pageInfo { hasNextPage endCursor }
        nodes { ...ShowFields }
      }
    }
  }
}
",
    show_fields!()
);

/// Shows of one tour overlapping an inclusive date window. Path: `tour.shows`.
pub const SHOWS_OVERLAPPING: &str = concat!(
    r"
query showsOverlapping($uuid: UUID!, $first: Int!, $cursor: String, $startDate: Date!, $endDate: Date!) {
  tour: node(uuid: $uuid) {
    ... on Tour {
      shows(first: $first, after: $cursor, showsOverlap: { start: $startDate, end: $endDate }) {
        pageInfo { hasNextPage endCursor }
        nodes { ...ShowFields }
      }
    }
  }
}
",
    show_fields!()
);

/// Itemized point-of-sale transactions of one show.
/// Path: `show.itemizedTransactions`.
pub const TRANSACTIONS: &str = r"
query transactions($uuid: UUID!, $first: Int!, $cursor: String) {
  show: node(uuid: $uuid) {
    ... on Show {
      itemizedTransactions(first: $first, after: $cursor) {
        pageInfo { hasNextPage endCursor }
        nodes {
          artistName
          beforeTaxPriceAmount
          cardholderName
          device
          discountName
          grossSoldAmount
          grossSoldAmountWithModifiers
          itemName
          itemizationType
          modifiers {
            discountAmount
            grossAmount
            modifierName
            refundedDiscountAmount
            refundedGrossAmount
            refundedTaxOneAmount
            refundedTaxTwoAmount
            taxOneAmount
            taxTwoAmount
            unitPriceAmount
          }
          netSoldAmount
          netSoldAmountWithModifiers
          orderId
          orderType
          paymentTimestamp
          productType
          refundedDiscountAmount
          refundedQuantity
          refundedTaxOneAmount
          refundedTaxTwoAmount
          size
          soldQuantity
          staffName
          standName
          taxOneAmount
          taxTwoAmount
          tenderType
          totalDiscountAmount
          totalRefundedAmount
          totalRefundedAmountWithModifiers
          unitPriceAmount
        }
      }
    }
  }
}
";

/// Main counts of a show's first settlement.
/// Path: `show.settlements.0.mainCounts`.
pub const COUNTS: &str = r"
query counts($uuid: UUID!, $first: Int!, $cursor: String) {
  show: node(uuid: $uuid) {
    ... on Show {
      settlements {
        path
        mainCounts(first: $first, after: $cursor) {
          pageInfo { hasNextPage endCursor }
          nodes {
            merchVariantUuid
            merchItemUuid
            priceOverride
            countIn
            countOut
            comps
            merchAdds { quantity }
          }
        }
      }
    }
  }
}
";

/// Merchandise catalogue of one account. Path: `account.merchItems`.
pub const MERCH_ITEMS: &str = r"
query merchItems($uuid: UUID!, $first: Int!, $cursor: String) {
  account: node(uuid: $uuid) {
    ... on Account {
      merchItems(first: $first, after: $cursor) {
        pageInfo { hasNextPage endCursor }
        nodes {
          uuid
          name
          category
          productType { name }
          merchVariants {
            uuid
            sku
            size
            price
          }
        }
      }
    }
  }
}
";
